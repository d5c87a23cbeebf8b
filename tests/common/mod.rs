//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use voice_command_rs::audio::{
    AudioChannelManager, AudioHal, ChannelConfig, ChannelId, PinMap, ShutdownSignal,
    TransferPolicy,
};
use voice_command_rs::commands::{CommandId, OutputPin};
use voice_command_rs::error::{HalError, RecognizerError};
use voice_command_rs::recognizer::{Detection, PhraseEntry, SpeechRecognizer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HalCall {
    Open(ChannelId),
    Enable(ChannelId),
    Disable(ChannelId),
    Read(usize),
    Write(usize),
}

/// State behind `FakeHal`, shared with the test through an `Arc`.
#[derive(Default)]
pub struct HalState {
    pub calls: Vec<HalCall>,
    /// Frames handed out by `read`, front first. When empty, reads fill the
    /// whole buffer with zeros.
    pub capture_frames: VecDeque<Vec<u8>>,
    /// Caps the bytes moved per read/write to simulate short transfers.
    pub transfer_limit: Option<usize>,
    pub fail_open: Option<ChannelId>,
    pub fail_enable: Option<ChannelId>,
    pub fail_disable: Option<ChannelId>,
    pub fail_io: bool,
    pub played: Vec<Vec<u8>>,
}

pub struct FakeHal(pub Arc<Mutex<HalState>>);

impl AudioHal for FakeHal {
    fn open(&mut self, config: &ChannelConfig) -> Result<(), HalError> {
        let mut s = self.0.lock().unwrap();
        s.calls.push(HalCall::Open(config.channel));
        if s.fail_open == Some(config.channel) {
            return Err(HalError::Device("no such device".to_string()));
        }
        Ok(())
    }

    fn enable(&mut self, channel: ChannelId) -> Result<(), HalError> {
        let mut s = self.0.lock().unwrap();
        s.calls.push(HalCall::Enable(channel));
        if s.fail_enable == Some(channel) {
            return Err(HalError::Device("enable refused".to_string()));
        }
        Ok(())
    }

    fn disable(&mut self, channel: ChannelId) -> Result<(), HalError> {
        let mut s = self.0.lock().unwrap();
        s.calls.push(HalCall::Disable(channel));
        if s.fail_disable == Some(channel) {
            return Err(HalError::Device("drain failed".to_string()));
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], _slice: Duration) -> Result<usize, HalError> {
        let mut s = self.0.lock().unwrap();
        if s.fail_io {
            return Err(HalError::Device("bus error".to_string()));
        }
        let limit = s.transfer_limit.unwrap_or(usize::MAX).min(buf.len());
        let n = match s.capture_frames.pop_front() {
            Some(frame) => {
                let n = frame.len().min(limit);
                buf[..n].copy_from_slice(&frame[..n]);
                n
            }
            None => {
                buf[..limit].fill(0);
                limit
            }
        };
        s.calls.push(HalCall::Read(n));
        Ok(n)
    }

    fn write(&mut self, data: &[u8], _slice: Duration) -> Result<usize, HalError> {
        let mut s = self.0.lock().unwrap();
        if s.fail_io {
            return Err(HalError::Device("bus error".to_string()));
        }
        let n = s.transfer_limit.unwrap_or(usize::MAX).min(data.len());
        s.calls.push(HalCall::Write(n));
        s.played.push(data[..n].to_vec());
        Ok(n)
    }
}

pub fn capture_pins() -> PinMap {
    PinMap { bclk: 5, ws: 4, data: 6 }
}

pub fn playback_pins() -> PinMap {
    PinMap { bclk: 15, ws: 16, data: 7 }
}

pub fn fake_manager() -> (AudioChannelManager, Arc<Mutex<HalState>>) {
    fake_manager_with(ShutdownSignal::new())
}

pub fn fake_manager_with(shutdown: ShutdownSignal) -> (AudioChannelManager, Arc<Mutex<HalState>>) {
    let state = Arc::new(Mutex::new(HalState::default()));
    let manager = AudioChannelManager::new(
        Box::new(FakeHal(state.clone())),
        capture_pins(),
        playback_pins(),
        TransferPolicy::default(),
        shutdown,
    );
    (manager, state)
}

/// Pin that records every level written to it.
#[derive(Clone, Default)]
pub struct FakePin {
    pub levels: Arc<Mutex<Vec<bool>>>,
    pub broken: bool,
}

impl OutputPin for FakePin {
    fn number(&self) -> u32 {
        21
    }

    fn set_level(&mut self, high: bool) -> io::Result<()> {
        if self.broken {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "gpio busy"));
        }
        self.levels.lock().unwrap().push(high);
        Ok(())
    }
}

/// Recognizer with a scripted detection queue, a configurable set of phrase
/// ids that fail to add and switches that make the table operations fail.
#[derive(Default)]
pub struct ScriptedRecognizer {
    pub log: Arc<Mutex<Vec<String>>>,
    pub failing_ids: Vec<CommandId>,
    pub rejected_on_commit: Vec<PhraseEntry>,
    pub detections: VecDeque<Detection>,
    pub fed_frames: Arc<Mutex<Vec<Vec<i16>>>>,
    pub phrases: Vec<PhraseEntry>,
    pub fail_load_defaults: bool,
    pub fail_clear: bool,
    pub fail_commit: bool,
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn load_defaults(&mut self) -> Result<(), RecognizerError> {
        self.log.lock().unwrap().push("load_defaults".to_string());
        if self.fail_load_defaults {
            return Err(RecognizerError::Engine("no default model".to_string()));
        }
        Ok(())
    }

    fn clear_phrases(&mut self) -> Result<(), RecognizerError> {
        self.log.lock().unwrap().push("clear".to_string());
        if self.fail_clear {
            return Err(RecognizerError::Engine("table locked".to_string()));
        }
        self.phrases.clear();
        Ok(())
    }

    fn add_phrase(&mut self, id: CommandId, phrase: &str) -> Result<(), RecognizerError> {
        self.log.lock().unwrap().push(format!("add {}", id));
        if self.failing_ids.contains(&id) {
            return Err(RecognizerError::Engine(format!("cannot add {}", phrase)));
        }
        self.phrases.push(PhraseEntry { id, phrase: phrase.to_string() });
        Ok(())
    }

    fn commit(&mut self) -> Result<Vec<PhraseEntry>, RecognizerError> {
        self.log.lock().unwrap().push("commit".to_string());
        if self.fail_commit {
            return Err(RecognizerError::Closed);
        }
        Ok(self.rejected_on_commit.clone())
    }

    fn active_phrases(&mut self) -> Result<Vec<PhraseEntry>, RecognizerError> {
        self.log.lock().unwrap().push("list".to_string());
        Ok(self.phrases.clone())
    }

    fn feed(&mut self, samples: &[i16]) -> Result<Detection, RecognizerError> {
        self.fed_frames.lock().unwrap().push(samples.to_vec());
        Ok(self.detections.pop_front().unwrap_or(Detection::Listening))
    }
}
