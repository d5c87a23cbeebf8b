//! ALSA PCM backend for the I2S microphone and amplifier.

use std::time::Duration;

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::{Direction, ValueOr};

use super::hal::{AudioHal, ChannelConfig, ChannelId, SampleWidth};
use crate::error::HalError;

/// Parameters negotiated with the ALSA hardware.
#[derive(Debug, Clone)]
pub struct AlsaParams {
    /// Actual sample rate after negotiation
    pub sample_rate: u32,
    /// Actual number of channels
    pub channels: u32,
    /// Period size in frames
    pub period_size: usize,
}

struct AlsaChannel {
    pcm: PCM,
    frame_bytes: usize,
}

/// `AudioHal` on top of two ALSA PCM devices. Pin roles are fixed by the
/// device tree on Linux boards, so the pin map is only logged here.
pub struct AlsaHal {
    capture_device: String,
    playback_device: String,
    capture: Option<AlsaChannel>,
    playback: Option<AlsaChannel>,
}

impl AlsaHal {
    pub fn new(capture_device: &str, playback_device: &str) -> Self {
        Self {
            capture_device: capture_device.to_string(),
            playback_device: playback_device.to_string(),
            capture: None,
            playback: None,
        }
    }

    fn channel(&self, id: ChannelId) -> Result<&AlsaChannel, HalError> {
        let slot = match id {
            ChannelId::Capture => self.capture.as_ref(),
            ChannelId::Playback => self.playback.as_ref(),
        };
        slot.ok_or_else(|| HalError::Device(format!("{} PCM not open", id)))
    }
}

fn open_pcm(device: &str, config: &ChannelConfig) -> Result<(PCM, AlsaParams), HalError> {
    let direction = match config.channel {
        ChannelId::Capture => Direction::Capture,
        ChannelId::Playback => Direction::Playback,
    };
    let pcm = PCM::new(device, direction, false).map_err(|e| {
        HalError::Device(format!(
            "Failed to open PCM device '{}' for {}: {}",
            device, config.channel, e
        ))
    })?;

    // Configure hardware parameters
    {
        let hwp = HwParams::any(&pcm)?;
        hwp.set_access(Access::RWInterleaved)?;
        hwp.set_format(match config.width {
            SampleWidth::Bits16 => Format::S16LE,
            SampleWidth::Bits32 => Format::S32LE,
        })?;
        hwp.set_channels(config.slot_mode.channels())?;
        hwp.set_rate_near(config.sample_rate, ValueOr::Nearest)?;
        pcm.hw_params(&hwp)?;
    }

    // Read back actual negotiated parameters
    let params = {
        let hwp = pcm.hw_params_current()?;
        AlsaParams {
            sample_rate: hwp.get_rate()?,
            channels: hwp.get_channels()?,
            period_size: hwp.get_period_size()? as usize,
        }
    };

    if params.sample_rate != config.sample_rate {
        log::warn!(
            target: "audio",
            "ALSA {}: requested {} Hz, hardware settled on {} Hz",
            config.channel,
            config.sample_rate,
            params.sample_rate,
        );
    }

    log::info!(
        target: "audio",
        "ALSA {}: device={}, rate={}, channels={}, period_size={}, pins(bclk={}, ws={}, data={})",
        config.channel,
        device,
        params.sample_rate,
        params.channels,
        params.period_size,
        config.pins.bclk,
        config.pins.ws,
        config.pins.data,
    );

    Ok((pcm, params))
}

fn timeout_ms(slice: Duration) -> u32 {
    slice.as_millis().min(u32::MAX as u128) as u32
}

impl AudioHal for AlsaHal {
    fn open(&mut self, config: &ChannelConfig) -> Result<(), HalError> {
        let device = match config.channel {
            ChannelId::Capture => &self.capture_device,
            ChannelId::Playback => &self.playback_device,
        };
        let (pcm, params) = open_pcm(device, config)?;
        let channel = AlsaChannel {
            pcm,
            frame_bytes: config.width.bytes() * params.channels as usize,
        };
        match config.channel {
            ChannelId::Capture => self.capture = Some(channel),
            ChannelId::Playback => self.playback = Some(channel),
        }
        Ok(())
    }

    fn enable(&mut self, id: ChannelId) -> Result<(), HalError> {
        let ch = self.channel(id)?;
        ch.pcm.prepare()?;
        // 录音通道不主动启动的话 wait() 会一直等不到数据
        if id == ChannelId::Capture {
            ch.pcm.start()?;
        }
        Ok(())
    }

    fn disable(&mut self, id: ChannelId) -> Result<(), HalError> {
        let ch = self.channel(id)?;
        match id {
            // 等缓冲区里的音频放完再停，避免截断提示音
            ChannelId::Playback => ch.pcm.drain()?,
            ChannelId::Capture => ch.pcm.drop()?,
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], slice: Duration) -> Result<usize, HalError> {
        let ch = self.channel(ChannelId::Capture)?;
        if !ch.pcm.wait(Some(timeout_ms(slice)))? {
            return Err(HalError::Timeout);
        }
        let whole = buf.len() - buf.len() % ch.frame_bytes;
        let io = ch.pcm.io_bytes();
        match io.readi(&mut buf[..whole]) {
            Ok(frames) => Ok(frames * ch.frame_bytes),
            Err(e) => {
                // Leave the PCM runnable for the next call; this call still fails.
                log::warn!(target: "audio", "ALSA capture error: {}, re-preparing", e);
                if ch.pcm.prepare().is_ok() {
                    let _ = ch.pcm.start();
                }
                Err(e.into())
            }
        }
    }

    fn write(&mut self, data: &[u8], slice: Duration) -> Result<usize, HalError> {
        let ch = self.channel(ChannelId::Playback)?;
        if !ch.pcm.wait(Some(timeout_ms(slice)))? {
            return Err(HalError::Timeout);
        }
        let whole = data.len() - data.len() % ch.frame_bytes;
        let io = ch.pcm.io_bytes();
        match io.writei(&data[..whole]) {
            Ok(frames) => Ok(frames * ch.frame_bytes),
            Err(e) => {
                log::warn!(target: "audio", "ALSA playback error: {}, re-preparing", e);
                let _ = ch.pcm.prepare();
                Err(e.into())
            }
        }
    }
}
