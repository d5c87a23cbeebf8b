//! Lifecycle and blocking transfers of the capture and playback channels.
//!
//! Playback is self-contained per call: enable → transfer → disable, so the
//! amplifier never idles on an enabled channel between utterances.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::conditioner::{SampleConditioner, samples_from_bytes, wide_samples_from_bytes};
use super::hal::{
    AudioHal, ChannelConfig, ChannelId, ChannelState, PinMap, SampleWidth, SlotMask, SlotMode,
};
use crate::error::{AudioError, HalError};

/// Cooperative shutdown flag shared between `main` and the processing loop.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds on one blocking transfer. `timeout: None` waits until the hardware
/// completes or shutdown is signalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPolicy {
    pub timeout: Option<Duration>,
    pub poll_interval: Duration,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            timeout: None,
            poll_interval: Duration::from_millis(100),
        }
    }
}

struct ChannelSlot {
    state: ChannelState,
    config: Option<ChannelConfig>,
    pins: PinMap,
}

impl ChannelSlot {
    fn new(pins: PinMap) -> Self {
        Self {
            state: ChannelState::Uninitialized,
            config: None,
            pins,
        }
    }
}

pub struct AudioChannelManager {
    hal: Box<dyn AudioHal>,
    capture: ChannelSlot,
    playback: ChannelSlot,
    conditioner: SampleConditioner,
    policy: TransferPolicy,
    shutdown: ShutdownSignal,
}

impl AudioChannelManager {
    pub fn new(
        hal: Box<dyn AudioHal>,
        capture_pins: PinMap,
        playback_pins: PinMap,
        policy: TransferPolicy,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            hal,
            capture: ChannelSlot::new(capture_pins),
            playback: ChannelSlot::new(playback_pins),
            conditioner: SampleConditioner::default(),
            policy,
            shutdown,
        }
    }

    pub fn with_conditioner(mut self, conditioner: SampleConditioner) -> Self {
        self.conditioner = conditioner;
        self
    }

    pub fn capture_state(&self) -> ChannelState {
        self.capture.state
    }

    pub fn playback_state(&self) -> ChannelState {
        self.playback.state
    }

    pub fn capture_config(&self) -> Option<&ChannelConfig> {
        self.capture.config.as_ref()
    }

    pub fn playback_config(&self) -> Option<&ChannelConfig> {
        self.playback.config.as_ref()
    }

    /// Number of channels fed to the recognizer. Capture is always mono.
    pub fn capture_channel_count(&self) -> u32 {
        SlotMode::Mono.channels()
    }

    /// Bring up the microphone channel as clock master and enable it.
    ///
    /// `channel_format` is logged but not honoured: the microphone only
    /// drives the left slot, so capture is always mono/left.
    pub fn init_capture(
        &mut self,
        sample_rate: u32,
        channel_format: u32,
        bits_per_sample: u32,
    ) -> Result<(), AudioError> {
        log::info!(
            target: "audio",
            "Initializing capture: rate={} Hz, channel_format={}, bits={}",
            sample_rate,
            channel_format,
            bits_per_sample,
        );
        if channel_format != 1 {
            log::warn!(
                target: "audio",
                "Capture requested channel_format={}, forcing mono/left slot",
                channel_format,
            );
        }

        let config = ChannelConfig {
            channel: ChannelId::Capture,
            sample_rate,
            width: SampleWidth::from_bits(bits_per_sample),
            slot_mode: SlotMode::Mono,
            slot_mask: SlotMask::Left,
            pins: self.capture.pins,
        };
        self.bring_up(config)
    }

    /// Bring up the amplifier channel as clock master and enable it.
    /// Here `channel_format == 1` selects mono, anything else stereo.
    pub fn init_playback(
        &mut self,
        sample_rate: u32,
        channel_format: u32,
        bits_per_sample: u32,
    ) -> Result<(), AudioError> {
        log::info!(
            target: "audio",
            "Initializing playback: rate={} Hz, channel_format={}, bits={}",
            sample_rate,
            channel_format,
            bits_per_sample,
        );

        let slot_mode = SlotMode::from_channel_format(channel_format);
        let config = ChannelConfig {
            channel: ChannelId::Playback,
            sample_rate,
            width: SampleWidth::from_bits(bits_per_sample),
            slot_mode,
            slot_mask: match slot_mode {
                SlotMode::Mono => SlotMask::Left,
                SlotMode::Stereo => SlotMask::Both,
            },
            pins: self.playback.pins,
        };
        self.bring_up(config)
    }

    fn bring_up(&mut self, config: ChannelConfig) -> Result<(), AudioError> {
        let channel = config.channel;
        let init_err = |source| AudioError::HardwareInit { channel, source };

        if let Err(source) = self.hal.open(&config) {
            log::error!(target: "audio", "Failed to open {} channel: {}", channel, source);
            return Err(init_err(source));
        }
        if let Err(source) = self.hal.enable(channel) {
            log::error!(target: "audio", "Failed to enable {} channel: {}", channel, source);
            return Err(init_err(source));
        }

        let slot = self.slot_mut(channel);
        slot.state = ChannelState::Enabled;
        slot.config = Some(config);
        log::info!(target: "audio", "{} channel ready", channel);
        Ok(())
    }

    fn slot_mut(&mut self, channel: ChannelId) -> &mut ChannelSlot {
        match channel {
            ChannelId::Capture => &mut self.capture,
            ChannelId::Playback => &mut self.playback,
        }
    }

    /// Blocking read of one capture frame. A short read is returned as
    /// success with the actual byte count.
    pub fn read_capture(&mut self, buf: &mut [u8]) -> Result<usize, AudioError> {
        if self.capture.state == ChannelState::Uninitialized {
            log::error!(target: "audio", "Capture channel not initialized");
            return Err(AudioError::InvalidState(ChannelId::Capture));
        }

        let requested = buf.len();
        let read = self
            .transfer(ChannelId::Capture, |hal, slice| hal.read(buf, slice))
            .inspect_err(|e| log::error!(target: "audio", "Failed to read capture frame: {}", e))?;

        if read != requested {
            log::warn!(
                target: "audio",
                "Expected to read {} bytes, got {}",
                requested,
                read,
            );
        }
        Ok(read)
    }

    /// Run the conditioner over a captured 16-bit frame unless `raw_mode` is
    /// set.
    pub fn condition_samples(&self, buf: &mut [u8], raw_mode: bool) {
        if !raw_mode {
            self.conditioner.process_bytes(buf);
        }
    }

    /// Turn one captured frame into the 16-bit samples the recognizer takes.
    ///
    /// 32-bit slots hold left-aligned microphone data, so only their top 16
    /// bits are kept before conditioning. `buf` may be modified in place.
    pub fn feed_samples(&self, buf: &mut [u8], raw_mode: bool) -> Vec<i16> {
        let width = self
            .capture
            .config
            .as_ref()
            .map_or(SampleWidth::Bits16, |c| c.width);

        match width {
            SampleWidth::Bits16 => {
                self.condition_samples(buf, raw_mode);
                samples_from_bytes(buf)
            }
            SampleWidth::Bits32 => {
                let wide = wide_samples_from_bytes(buf);
                if raw_mode {
                    wide.into_iter().map(|s| s as i16).collect()
                } else {
                    let mut samples = vec![0i16; wide.len()];
                    self.conditioner.process_wide(&wide, &mut samples);
                    samples
                }
            }
        }
    }

    /// Play one PCM buffer: re-enable if needed, transfer, then disable.
    pub fn write_playback(&mut self, data: &[u8]) -> Result<usize, AudioError> {
        if self.playback.state == ChannelState::Uninitialized {
            log::error!(target: "audio", "Playback channel not initialized");
            return Err(AudioError::InvalidState(ChannelId::Playback));
        }
        if data.is_empty() {
            log::error!(target: "audio", "Refusing to play empty audio buffer");
            return Err(AudioError::InvalidArgument("playback data is empty"));
        }

        if self.playback.state == ChannelState::Disabled {
            if let Err(source) = self.hal.enable(ChannelId::Playback) {
                log::error!(target: "audio", "Failed to re-enable playback channel: {}", source);
                return Err(AudioError::HardwareIo {
                    channel: ChannelId::Playback,
                    source,
                });
            }
            self.playback.state = ChannelState::Enabled;
            log::debug!(target: "audio", "Playback channel re-enabled");
        }

        let written = self
            .transfer(ChannelId::Playback, |hal, slice| hal.write(data, slice))
            .inspect_err(|e| log::error!(target: "audio", "Failed to write playback data: {}", e))?;

        if written != data.len() {
            log::warn!(
                target: "audio",
                "Expected to write {} bytes, wrote {}",
                data.len(),
                written,
            );
        }

        // The next write re-enables (and re-prepares) the channel either way.
        if let Err(e) = self.stop_playback() {
            log::warn!(target: "audio", "Stopping playback after write failed: {}", e);
            self.playback.state = ChannelState::Disabled;
        }

        log::info!(target: "audio", "Playback finished, {} bytes", written);
        Ok(written)
    }

    /// Disable the playback channel. Safe to call in any state.
    pub fn stop_playback(&mut self) -> Result<(), AudioError> {
        match self.playback.state {
            ChannelState::Uninitialized => {
                log::warn!(target: "audio", "Playback channel not initialized, nothing to stop");
                Ok(())
            }
            ChannelState::Disabled => {
                log::debug!(target: "audio", "Playback channel already disabled");
                Ok(())
            }
            ChannelState::Enabled => {
                self.hal.disable(ChannelId::Playback).map_err(|source| {
                    log::error!(target: "audio", "Failed to disable playback channel: {}", source);
                    AudioError::HardwareIo {
                        channel: ChannelId::Playback,
                        source,
                    }
                })?;
                self.playback.state = ChannelState::Disabled;
                log::info!(target: "audio", "Playback output stopped");
                Ok(())
            }
        }
    }

    /// Drive one HAL transfer in `poll_interval` slices until it completes,
    /// the policy deadline passes, or shutdown is signalled.
    fn transfer<F>(&mut self, channel: ChannelId, mut op: F) -> Result<usize, AudioError>
    where
        F: FnMut(&mut dyn AudioHal, Duration) -> Result<usize, HalError>,
    {
        let started = Instant::now();
        loop {
            if self.shutdown.is_triggered() {
                return Err(AudioError::Cancelled(channel));
            }

            let slice = match self.policy.timeout {
                Some(timeout) => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        return Err(AudioError::Timeout { channel, waited });
                    }
                    (timeout - waited).min(self.policy.poll_interval)
                }
                None => self.policy.poll_interval,
            };

            match op(self.hal.as_mut(), slice) {
                Ok(n) => return Ok(n),
                Err(HalError::Timeout) => continue,
                Err(source) => return Err(AudioError::HardwareIo { channel, source }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Shared {
        calls: Vec<String>,
        pending_timeouts: usize,
    }

    struct StubHal(Arc<Mutex<Shared>>);

    impl AudioHal for StubHal {
        fn open(&mut self, config: &ChannelConfig) -> Result<(), HalError> {
            self.0.lock().unwrap().calls.push(format!("open {}", config.channel));
            Ok(())
        }

        fn enable(&mut self, channel: ChannelId) -> Result<(), HalError> {
            self.0.lock().unwrap().calls.push(format!("enable {}", channel));
            Ok(())
        }

        fn disable(&mut self, channel: ChannelId) -> Result<(), HalError> {
            self.0.lock().unwrap().calls.push(format!("disable {}", channel));
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8], _slice: Duration) -> Result<usize, HalError> {
            let mut shared = self.0.lock().unwrap();
            if shared.pending_timeouts > 0 {
                shared.pending_timeouts -= 1;
                return Err(HalError::Timeout);
            }
            shared.calls.push("read".to_string());
            Ok(buf.len())
        }

        fn write(&mut self, data: &[u8], _slice: Duration) -> Result<usize, HalError> {
            self.0.lock().unwrap().calls.push("write".to_string());
            Ok(data.len())
        }
    }

    fn pins() -> PinMap {
        PinMap { bclk: 5, ws: 4, data: 6 }
    }

    fn manager(policy: TransferPolicy) -> (AudioChannelManager, Arc<Mutex<Shared>>, ShutdownSignal) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let shutdown = ShutdownSignal::new();
        let manager = AudioChannelManager::new(
            Box::new(StubHal(shared.clone())),
            pins(),
            pins(),
            policy,
            shutdown.clone(),
        );
        (manager, shared, shutdown)
    }

    #[test]
    fn test_capture_forced_mono_left() {
        let (mut manager, _, _) = manager(TransferPolicy::default());
        manager.init_capture(16000, 2, 32).unwrap();
        let config = manager.capture_config().unwrap();
        assert_eq!(config.slot_mode, SlotMode::Mono);
        assert_eq!(config.slot_mask, SlotMask::Left);
        assert_eq!(config.width, SampleWidth::Bits32);
        assert_eq!(manager.capture_channel_count(), 1);
        assert_eq!(manager.capture_state(), ChannelState::Enabled);
    }

    #[test]
    fn test_playback_honours_stereo() {
        let (mut manager, _, _) = manager(TransferPolicy::default());
        manager.init_playback(16000, 2, 16).unwrap();
        let config = manager.playback_config().unwrap();
        assert_eq!(config.slot_mode, SlotMode::Stereo);
        assert_eq!(config.slot_mask, SlotMask::Both);
    }

    #[test]
    fn test_timeout_slices_are_retried() {
        let (mut manager, shared, _) = manager(TransferPolicy::default());
        manager.init_capture(16000, 1, 16).unwrap();
        shared.lock().unwrap().pending_timeouts = 3;
        let mut buf = [0u8; 64];
        assert_eq!(manager.read_capture(&mut buf).unwrap(), 64);
    }

    #[test]
    fn test_deadline_expires() {
        let policy = TransferPolicy {
            timeout: Some(Duration::from_millis(20)),
            poll_interval: Duration::from_millis(5),
        };
        let (mut manager, shared, _) = manager(policy);
        manager.init_capture(16000, 1, 16).unwrap();
        shared.lock().unwrap().pending_timeouts = usize::MAX;
        let mut buf = [0u8; 64];
        let err = manager.read_capture(&mut buf).unwrap_err();
        assert!(matches!(err, AudioError::Timeout { channel: ChannelId::Capture, .. }));
    }

    #[test]
    fn test_32_bit_frames_keep_top_half() {
        let (manager, _, _) = manager(TransferPolicy::default());
        let mut manager = manager.with_conditioner(SampleConditioner::with_gain(2));
        manager.init_capture(16000, 1, 32).unwrap();

        let slots: [i32; 4] = [(1000 << 16) | 0xABCD, -5 << 16, i32::MAX, 20_000 << 16];
        let frame: Vec<u8> = slots.iter().flat_map(|s| s.to_le_bytes()).collect();

        let mut buf = frame.clone();
        assert_eq!(manager.feed_samples(&mut buf, true), vec![1000, -5, i16::MAX, 20_000]);

        let mut buf = frame;
        assert_eq!(manager.feed_samples(&mut buf, false), vec![2000, -10, i16::MAX, i16::MAX]);
    }

    #[test]
    fn test_shutdown_signal_shared_between_clones() {
        let signal = ShutdownSignal::new();
        let other = signal.clone();
        assert!(!other.is_triggered());
        signal.trigger();
        assert!(other.is_triggered());
    }

    #[test]
    fn test_shutdown_cancels_transfer() {
        let (mut manager, shared, shutdown) = manager(TransferPolicy::default());
        manager.init_playback(16000, 1, 16).unwrap();
        shutdown.trigger();
        let err = manager.write_playback(&[1, 2, 3, 4]).unwrap_err();
        assert!(matches!(err, AudioError::Cancelled(ChannelId::Playback)));
        assert!(!shared.lock().unwrap().calls.contains(&"write".to_string()));
    }
}
