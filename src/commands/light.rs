use super::command::{AudioClip, CommandDescriptor, CommandId, VoiceCommand};
use super::gpio::OutputPin;
use crate::audio::AudioChannelManager;
use crate::error::CommandError;

pub const LIGHT_ON_ID: CommandId = 309;
pub const LIGHT_OFF_ID: CommandId = 308;

/// 开灯 / 关灯: drive the LED pin, then play the confirmation clip.
pub struct LightCommand {
    descriptor: CommandDescriptor,
    level: bool,
    pin: Box<dyn OutputPin>,
    clip: AudioClip,
}

impl LightCommand {
    pub fn on(pin: Box<dyn OutputPin>, clip: AudioClip) -> Self {
        Self {
            descriptor: CommandDescriptor::new(LIGHT_ON_ID, "bang wo kai deng", "帮我开灯"),
            level: true,
            pin,
            clip,
        }
    }

    pub fn off(pin: Box<dyn OutputPin>, clip: AudioClip) -> Self {
        Self {
            descriptor: CommandDescriptor::new(LIGHT_OFF_ID, "bang wo guan deng", "帮我关灯"),
            level: false,
            pin,
            clip,
        }
    }
}

impl VoiceCommand for LightCommand {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    fn execute(&mut self, audio: &mut AudioChannelManager) -> Result<(), CommandError> {
        log::info!(target: "commands", "💡 {}", self.descriptor.description);

        let pin = self.pin.number();
        self.pin
            .set_level(self.level)
            .map_err(|source| CommandError::Gpio { pin, source })?;
        log::info!(
            target: "commands",
            "LED on GPIO {} {}",
            pin,
            if self.level { "on" } else { "off" },
        );

        self.clip.play_feedback(audio);
        Ok(())
    }
}
