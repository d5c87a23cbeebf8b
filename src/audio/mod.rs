//! audio - capture/playback channel management for the I2S microphone and
//! amplifier.
//!
//! The channel manager owns the lifecycle of both channels and all blocking
//! transfers; `AlsaHal` is the board backend, `SampleConditioner` the
//! post-processing applied to captured frames.

mod alsa_device;
mod channel_manager;
mod conditioner;
mod hal;

pub use alsa_device::{AlsaHal, AlsaParams};
pub use channel_manager::{AudioChannelManager, ShutdownSignal, TransferPolicy};
pub use conditioner::{SampleConditioner, samples_from_bytes, wide_samples_from_bytes};
pub use hal::{
    AudioHal, ChannelConfig, ChannelId, ChannelState, PinMap, SampleWidth, SlotMask, SlotMode,
};
