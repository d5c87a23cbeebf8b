use super::command::{AudioClip, CommandDescriptor, CommandId, VoiceCommand};
use crate::audio::AudioChannelManager;
use crate::error::CommandError;

pub const FAREWELL_ID: CommandId = 314;

/// 拜拜: say goodbye and end the session.
pub struct FarewellCommand {
    descriptor: CommandDescriptor,
    clip: AudioClip,
}

impl FarewellCommand {
    pub fn new(clip: AudioClip) -> Self {
        Self {
            descriptor: CommandDescriptor::new(FAREWELL_ID, "bai bai", "拜拜").terminating(),
            clip,
        }
    }
}

impl VoiceCommand for FarewellCommand {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn execute(&mut self, audio: &mut AudioChannelManager) -> Result<(), CommandError> {
        log::info!(target: "commands", "👋 {}", self.descriptor.description);
        self.clip.play_feedback(audio);
        Ok(())
    }
}
