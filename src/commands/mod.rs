//! Voice commands and the registry that dispatches recognized ids to them.

mod command;
mod farewell;
mod gpio;
mod light;
mod registry;

pub use command::{AudioClip, CommandDescriptor, CommandId, VoiceCommand};
pub use farewell::{FAREWELL_ID, FarewellCommand};
pub use gpio::{OutputPin, SysfsPin};
pub use light::{LIGHT_OFF_ID, LIGHT_ON_ID, LightCommand};
pub use registry::{
    CommandOutcome, CommandRegistry, FeedbackClips, UNKNOWN_COMMAND, VocabularyReport,
};
