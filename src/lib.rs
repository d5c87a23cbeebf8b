//! Audio I/O and command dispatch for a voice-controlled appliance.
//!
//! - `audio`: capture/playback channel lifecycle and sample conditioning
//! - `commands`: voice commands, registry and dispatcher
//! - `recognizer`: phrase-table and frame-feeding bridge to the speech engine
//! - `session`: the capture → recognize → dispatch loop
//! - `config`: build-time board configuration
//! - `error`: error types

pub mod audio;
pub mod commands;
pub mod config;
pub mod error;
pub mod recognizer;
pub mod session;

pub use audio::{AudioChannelManager, SampleConditioner, ShutdownSignal, TransferPolicy};
pub use commands::{CommandOutcome, CommandRegistry, VoiceCommand};
pub use config::Config;
pub use recognizer::{RecognizerLink, SpeechRecognizer};
pub use session::{SessionEnd, VoiceSession};
