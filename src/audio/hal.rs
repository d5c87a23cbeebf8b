//! Hardware seam for the two audio channels.

use std::fmt;
use std::time::Duration;

use crate::error::HalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Capture,
    Playback,
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::Capture => write!(f, "capture"),
            ChannelId::Playback => write!(f, "playback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Uninitialized,
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleWidth {
    Bits16,
    Bits32,
}

impl SampleWidth {
    /// 32 selects 32-bit slots; anything else falls back to 16-bit.
    pub fn from_bits(bits: u32) -> Self {
        if bits == 32 {
            SampleWidth::Bits32
        } else {
            SampleWidth::Bits16
        }
    }

    pub fn bytes(&self) -> usize {
        match self {
            SampleWidth::Bits16 => 2,
            SampleWidth::Bits32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMode {
    Mono,
    Stereo,
}

impl SlotMode {
    pub fn from_channel_format(channel_format: u32) -> Self {
        if channel_format == 1 {
            SlotMode::Mono
        } else {
            SlotMode::Stereo
        }
    }

    pub fn channels(&self) -> u32 {
        match self {
            SlotMode::Mono => 1,
            SlotMode::Stereo => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMask {
    Left,
    Both,
}

/// GPIO roles of one I2S link. `data` is data-in for capture and data-out for
/// playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    pub bclk: u32,
    pub ws: u32,
    pub data: u32,
}

/// Everything the backend needs to bring up one channel. The board always
/// drives the clocks (master role), so there is no role field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub channel: ChannelId,
    pub sample_rate: u32,
    pub width: SampleWidth,
    pub slot_mode: SlotMode,
    pub slot_mask: SlotMask,
    pub pins: PinMap,
}

impl ChannelConfig {
    /// Bytes per interleaved frame (all slots of one sample instant).
    pub fn frame_bytes(&self) -> usize {
        self.width.bytes() * self.slot_mode.channels() as usize
    }
}

/// Blocking channel operations provided by the board.
///
/// `read`/`write` wait at most `slice` and report `HalError::Timeout` when no
/// data moved in that time; the channel manager owns the overall deadline and
/// the shutdown check.
pub trait AudioHal: Send {
    fn open(&mut self, config: &ChannelConfig) -> Result<(), HalError>;

    fn enable(&mut self, channel: ChannelId) -> Result<(), HalError>;

    fn disable(&mut self, channel: ChannelId) -> Result<(), HalError>;

    fn read(&mut self, buf: &mut [u8], slice: Duration) -> Result<usize, HalError>;

    fn write(&mut self, data: &[u8], slice: Duration) -> Result<usize, HalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_and_slots() {
        assert_eq!(SampleWidth::from_bits(32), SampleWidth::Bits32);
        assert_eq!(SampleWidth::from_bits(24), SampleWidth::Bits16);
        assert_eq!(SlotMode::from_channel_format(1), SlotMode::Mono);
        assert_eq!(SlotMode::from_channel_format(2), SlotMode::Stereo);
        assert_eq!(SlotMode::from_channel_format(0), SlotMode::Stereo);
    }

    #[test]
    fn test_frame_bytes() {
        let config = ChannelConfig {
            channel: ChannelId::Playback,
            sample_rate: 16000,
            width: SampleWidth::Bits32,
            slot_mode: SlotMode::Stereo,
            slot_mask: SlotMask::Both,
            pins: PinMap { bclk: 15, ws: 16, data: 7 },
        };
        assert_eq!(config.frame_bytes(), 8);
    }
}
