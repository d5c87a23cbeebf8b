//! The processing loop: capture → condition → recognize → dispatch.
//!
//! `VoiceSession` is the one context object the loop needs. It is built once
//! at startup and moved onto the worker that runs the loop, so nothing else
//! can touch the channels or the registry while it runs.

use crate::audio::{AudioChannelManager, ShutdownSignal};
use crate::commands::{CommandOutcome, CommandRegistry, VocabularyReport};
use crate::error::{AudioError, RecognizerError, SessionError};
use crate::recognizer::{Detection, SpeechRecognizer};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// A terminating command ran successfully.
    ExitRequested,
    /// The shutdown signal was raised.
    Shutdown,
}

pub struct VoiceSession {
    audio: AudioChannelManager,
    registry: CommandRegistry,
    recognizer: Box<dyn SpeechRecognizer>,
    shutdown: ShutdownSignal,
    frame: Vec<u8>,
    raw_capture: bool,
}

impl VoiceSession {
    pub fn new(
        audio: AudioChannelManager,
        registry: CommandRegistry,
        recognizer: Box<dyn SpeechRecognizer>,
        shutdown: ShutdownSignal,
        frame_bytes: usize,
        raw_capture: bool,
    ) -> Self {
        Self {
            audio,
            registry,
            recognizer,
            shutdown,
            frame: vec![0u8; frame_bytes],
            raw_capture,
        }
    }

    pub fn audio(&self) -> &AudioChannelManager {
        &self.audio
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn sync_vocabulary(&mut self) -> Result<VocabularyReport, RecognizerError> {
        self.registry.sync_vocabulary(self.recognizer.as_mut())
    }

    /// One capture/recognize/dispatch cycle. Returns `Some` when the loop
    /// has to stop.
    pub fn step(&mut self) -> Result<Option<SessionEnd>, SessionError> {
        if self.shutdown.is_triggered() {
            return Ok(Some(SessionEnd::Shutdown));
        }

        let read = match self.audio.read_capture(&mut self.frame) {
            Ok(n) => n,
            Err(AudioError::Cancelled(_)) => return Ok(Some(SessionEnd::Shutdown)),
            Err(AudioError::Timeout { waited, .. }) => {
                log::warn!(target: "session", "No microphone data for {:?}, skipping frame", waited);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let samples = self
            .audio
            .feed_samples(&mut self.frame[..read], self.raw_capture);

        match self.recognizer.feed(&samples)? {
            Detection::Listening => Ok(None),
            Detection::WakeWord => {
                log::info!(target: "session", "Wake word detected, listening for a command");
                Ok(None)
            }
            Detection::Timeout => {
                log::info!(target: "session", "Command window closed, waiting for wake word");
                Ok(None)
            }
            Detection::Command(id) => {
                log::info!(
                    target: "session",
                    "Recognized command [{}] {}",
                    id,
                    self.registry.description(id),
                );
                match self.registry.execute(id, &mut self.audio) {
                    CommandOutcome::ExitRequested => Ok(Some(SessionEnd::ExitRequested)),
                    outcome => {
                        log::info!(target: "session", "Command [{}] finished: {}", id, outcome);
                        Ok(None)
                    }
                }
            }
        }
    }

    pub fn run(&mut self) -> Result<SessionEnd, SessionError> {
        log::info!(
            target: "session",
            "Voice loop started: frame={} bytes, feed channels={}, raw={}",
            self.frame.len(),
            self.audio.capture_channel_count(),
            self.raw_capture,
        );
        loop {
            if let Some(end) = self.step()? {
                log::info!(target: "session", "Voice loop stopped: {:?}", end);
                return Ok(end);
            }
        }
    }
}
