//! Command registry and dispatcher.
//!
//! Commands are kept in registration order. Identifiers are unique: a second
//! registration with a known id is rejected, so lookups always reach the
//! first command registered under it.

use std::fmt;

use super::command::{AudioClip, CommandDescriptor, CommandId, VoiceCommand};
use super::farewell::FarewellCommand;
use super::gpio::OutputPin;
use super::light::LightCommand;
use crate::audio::AudioChannelManager;
use crate::error::{CommandError, RecognizerError};
use crate::recognizer::{PhraseEntry, SpeechRecognizer};

pub const UNKNOWN_COMMAND: &str = "未知命令";

/// 命令执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    NotFound,
    ExecutionFailed,
    ExitRequested,
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Success => write!(f, "success"),
            CommandOutcome::NotFound => write!(f, "not found"),
            CommandOutcome::ExecutionFailed => write!(f, "execution failed"),
            CommandOutcome::ExitRequested => write!(f, "exit requested"),
        }
    }
}

/// Result of pushing the registry into the recognizer's phrase table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyReport {
    pub added: usize,
    pub failed: usize,
    /// Phrases the engine refused at commit time.
    pub rejected: Vec<PhraseEntry>,
}

impl VocabularyReport {
    /// True when every phrase was accepted by `add_phrase`.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Clips for the built-in commands.
#[derive(Debug, Clone)]
pub struct FeedbackClips {
    pub light_on: AudioClip,
    pub light_off: AudioClip,
    pub farewell: AudioClip,
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Box<dyn VoiceCommand>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the appliance's built-in commands: light on, light off
    /// and farewell. The two light commands drive the same LED line.
    pub fn with_builtin_commands(
        led_on: Box<dyn OutputPin>,
        led_off: Box<dyn OutputPin>,
        clips: FeedbackClips,
    ) -> Result<Self, CommandError> {
        log::info!(target: "commands", "Initializing command registry...");
        let mut registry = Self::new();
        registry.register(Box::new(LightCommand::on(led_on, clips.light_on)))?;
        registry.register(Box::new(LightCommand::off(led_off, clips.light_off)))?;
        registry.register(Box::new(FarewellCommand::new(clips.farewell)))?;
        log::info!(
            target: "commands",
            "✓ Command registry ready, {} commands registered",
            registry.len(),
        );
        Ok(registry)
    }

    pub fn register(&mut self, command: Box<dyn VoiceCommand>) -> Result<(), CommandError> {
        let id = command.id();
        if id == 0 {
            log::error!(target: "commands", "Rejected '{}': id must be positive", command.description());
            return Err(CommandError::InvalidId(id));
        }
        if let Some(existing) = self.find(id) {
            let err = CommandError::DuplicateId {
                id,
                existing: existing.description().to_string(),
                rejected: command.description().to_string(),
            };
            log::error!(target: "commands", "{}", err);
            return Err(err);
        }

        log::debug!(target: "commands", "Registered [{}] {}", id, command.description());
        self.commands.push(command);
        Ok(())
    }

    pub fn find(&self, id: CommandId) -> Option<&dyn VoiceCommand> {
        self.commands
            .iter()
            .find(|c| c.id() == id)
            .map(|c| c.as_ref())
    }

    fn find_mut(&mut self, id: CommandId) -> Option<&mut Box<dyn VoiceCommand>> {
        self.commands.iter_mut().find(|c| c.id() == id)
    }

    /// Run the command registered under `id`.
    pub fn execute(&mut self, id: CommandId, audio: &mut AudioChannelManager) -> CommandOutcome {
        let Some(command) = self.find_mut(id) else {
            log::warn!(target: "commands", "⚠️  Unknown command id: {}", id);
            return CommandOutcome::NotFound;
        };

        match command.execute(audio) {
            Ok(()) if command.terminates_session() => {
                log::info!(target: "commands", "Command [{}] requested session exit", id);
                CommandOutcome::ExitRequested
            }
            Ok(()) => CommandOutcome::Success,
            Err(e) => {
                log::error!(target: "commands", "Command [{}] {} failed: {}", id, command.description(), e);
                CommandOutcome::ExecutionFailed
            }
        }
    }

    pub fn description(&self, id: CommandId) -> &str {
        self.find(id).map_or(UNKNOWN_COMMAND, |c| c.description())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.iter().map(|c| c.descriptor())
    }

    pub fn log_supported_commands(&self) {
        log::info!(target: "commands", "Supported voice commands:");
        for d in self.descriptors() {
            log::info!(target: "commands", "  ID={}: '{}'", d.id, d.description);
        }
    }

    /// Rebuild the recognizer's phrase table from this registry.
    ///
    /// Individual phrase failures are logged and counted; only a failure to
    /// reset the table or to commit aborts the sync.
    pub fn sync_vocabulary(
        &self,
        engine: &mut dyn SpeechRecognizer,
    ) -> Result<VocabularyReport, RecognizerError> {
        log::info!(target: "commands", "Configuring command phrases...");

        if let Err(e) = engine.load_defaults() {
            log::warn!(target: "commands", "Loading default phrases failed: {}", e);
        }

        engine.clear_phrases().inspect_err(|e| {
            log::error!(target: "commands", "Failed to reset phrase table: {}", e)
        })?;

        let mut report = VocabularyReport::default();
        for d in self.descriptors() {
            log::info!(target: "commands", "Adding phrase [{}]: {} ({})", d.id, d.description, d.pinyin);
            match engine.add_phrase(d.id, &d.pinyin) {
                Ok(()) => {
                    report.added += 1;
                    log::info!(target: "commands", "✓ phrase [{}] added", d.id);
                }
                Err(e) => {
                    report.failed += 1;
                    log::error!(target: "commands", "✗ phrase [{}] failed: {}", d.id, e);
                }
            }
        }

        log::info!(target: "commands", "Committing phrases to the model...");
        report.rejected = engine.commit()?;
        if !report.rejected.is_empty() {
            log::warn!(target: "commands", "{} phrases rejected by the engine:", report.rejected.len());
            for p in &report.rejected {
                log::warn!(target: "commands", "  rejected {}: {}", p.id, p.phrase);
            }
        }

        log::info!(
            target: "commands",
            "Phrase configuration done: {} added, {} failed",
            report.added,
            report.failed,
        );

        match engine.active_phrases() {
            Ok(active) => {
                log::info!(target: "commands", "Active phrases:");
                for p in active {
                    log::info!(target: "commands", "  {}: {}", p.id, p.phrase);
                }
            }
            Err(e) => log::warn!(target: "commands", "Listing active phrases failed: {}", e),
        }
        self.log_supported_commands();

        Ok(report)
    }
}
