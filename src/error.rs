//! Error types shared across the audio, command and recognizer layers.

use std::time::Duration;

use thiserror::Error;

use crate::audio::ChannelId;
use crate::commands::CommandId;

/// Failure reported by the hardware backend.
#[derive(Error, Debug)]
pub enum HalError {
    #[error("transfer did not complete within the wait slice")]
    Timeout,

    #[error("device error: {0}")]
    Device(String),
}

impl From<alsa::Error> for HalError {
    fn from(e: alsa::Error) -> Self {
        HalError::Device(e.to_string())
    }
}

/// Audio channel errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("{channel} channel init failed: {source}")]
    HardwareInit {
        channel: ChannelId,
        #[source]
        source: HalError,
    },

    #[error("{channel} channel I/O failed: {source}")]
    HardwareIo {
        channel: ChannelId,
        #[source]
        source: HalError,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("{0} channel is not initialized")]
    InvalidState(ChannelId),

    #[error("{channel} transfer timed out after {waited:?}")]
    Timeout { channel: ChannelId, waited: Duration },

    #[error("{0} transfer cancelled by shutdown")]
    Cancelled(ChannelId),
}

/// Command registration and execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("command id must be positive, got {0}")]
    InvalidId(CommandId),

    #[error("command id {id} already registered by '{existing}', rejected '{rejected}'")]
    DuplicateId {
        id: CommandId,
        existing: String,
        rejected: String,
    },

    #[error("gpio {pin}: {source}")]
    Gpio {
        pin: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("audio feedback failed: {0}")]
    Audio(#[from] AudioError),
}

/// Errors talking to the external recognition engine
#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("failed to spawn recognizer {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("recognizer I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("recognizer message error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("recognizer rejected request: {0}")]
    Engine(String),

    #[error("unexpected recognizer reply: {0}")]
    Protocol(String),

    #[error("recognizer closed its output")]
    Closed,
}

/// Errors that end the processing loop
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue {
        key: &'static str,
        value: &'static str,
    },
}
