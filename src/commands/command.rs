use std::sync::Arc;

use crate::audio::AudioChannelManager;
use crate::error::CommandError;

pub type CommandId = u32;

/// Identity of a command as seen by the recognizer and the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub id: CommandId,
    /// 拼音表示，识别引擎用它匹配语音
    pub pinyin: String,
    /// 中文描述
    pub description: String,
    /// A successful run ends the voice session.
    pub terminates_session: bool,
}

impl CommandDescriptor {
    pub fn new(id: CommandId, pinyin: &str, description: &str) -> Self {
        Self {
            id,
            pinyin: pinyin.to_string(),
            description: description.to_string(),
            terminates_session: false,
        }
    }

    pub fn terminating(mut self) -> Self {
        self.terminates_session = true;
        self
    }
}

/// A voice command: one hardware side effect plus spoken feedback.
pub trait VoiceCommand: Send {
    fn descriptor(&self) -> &CommandDescriptor;

    fn execute(&mut self, audio: &mut AudioChannelManager) -> Result<(), CommandError>;

    fn id(&self) -> CommandId {
        self.descriptor().id
    }

    fn pinyin(&self) -> &str {
        &self.descriptor().pinyin
    }

    fn description(&self) -> &str {
        &self.descriptor().description
    }

    fn terminates_session(&self) -> bool {
        self.descriptor().terminates_session
    }
}

/// Opaque PCM buffer handed to the playback channel as-is.
#[derive(Debug, Clone)]
pub struct AudioClip {
    name: &'static str,
    pcm: Arc<[u8]>,
}

impl AudioClip {
    pub fn new(name: &'static str, pcm: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name,
            pcm: pcm.into(),
        }
    }

    pub fn empty(name: &'static str) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pcm(&self) -> &[u8] {
        &self.pcm
    }

    /// Play the clip; failures are logged and otherwise ignored so that a
    /// missing confirmation sound never undoes the hardware action.
    pub fn play_feedback(&self, audio: &mut AudioChannelManager) {
        match audio.write_playback(&self.pcm) {
            Ok(_) => log::info!(target: "commands", "✓ played clip '{}'", self.name),
            Err(e) => log::error!(target: "commands", "Failed to play clip '{}': {}", self.name, e),
        }
    }
}
