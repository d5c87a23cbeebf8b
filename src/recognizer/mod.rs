//! Bridge to the external speech-recognition engine.
//!
//! The engine owns the model and the phrase table; this crate only pushes
//! the vocabulary and feeds conditioned frames.

mod link;
pub mod protocol;

pub use link::RecognizerLink;
pub use protocol::{Detection, PhraseEntry};

use crate::commands::CommandId;
use crate::error::RecognizerError;

/// Phrase-table and detection API of the engine.
pub trait SpeechRecognizer: Send {
    /// Load the vocabulary shipped in the engine's own configuration.
    fn load_defaults(&mut self) -> Result<(), RecognizerError>;

    /// Drop every phrase and prepare an empty table.
    fn clear_phrases(&mut self) -> Result<(), RecognizerError>;

    fn add_phrase(&mut self, id: CommandId, phrase: &str) -> Result<(), RecognizerError>;

    /// Apply the pending table; returns the phrases the engine refused.
    fn commit(&mut self) -> Result<Vec<PhraseEntry>, RecognizerError>;

    fn active_phrases(&mut self) -> Result<Vec<PhraseEntry>, RecognizerError>;

    /// Feed one mono 16-bit frame.
    fn feed(&mut self, samples: &[i16]) -> Result<Detection, RecognizerError>;
}
