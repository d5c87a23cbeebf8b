use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::audio::{PinMap, TransferPolicy};
use crate::error::ConfigError;

/// One audio channel as described in config.toml.
#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub device: &'static str,
    pub sample_rate: u32,
    pub channel_format: u32,
    pub bits_per_sample: u32,
    pub pins: PinMap,
}

#[derive(Debug, Clone)]
pub struct Config {
    // 应用和板子信息
    pub app_name: &'static str,
    pub app_version: &'static str,
    pub board_type: &'static str,
    pub board_name: &'static str,

    // 录音通道配置
    pub capture: ChannelSettings,
    pub capture_frame_bytes: usize,
    pub capture_raw: bool,
    pub capture_gain: i32,

    // 播放通道配置
    pub playback: ChannelSettings,

    // 传输超时，None 表示无限等待
    pub transfer_timeout: Option<Duration>,
    pub transfer_poll_interval: Duration,

    // 命令配置
    pub led_gpio: u32,
    pub assets_dir: PathBuf,

    // 识别引擎进程
    pub recognizer_executable: &'static str,
    pub recognizer_args: Vec<String>,
}

fn parse<T: FromStr>(key: &'static str, value: &'static str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

impl Config {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self, ConfigError> {
        let timeout_ms: u64 = parse("TRANSFER_TIMEOUT_MS", env!("TRANSFER_TIMEOUT_MS"))?;
        let poll_ms: u64 = parse("TRANSFER_POLL_INTERVAL_MS", env!("TRANSFER_POLL_INTERVAL_MS"))?;
        if poll_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TRANSFER_POLL_INTERVAL_MS",
                value: env!("TRANSFER_POLL_INTERVAL_MS"),
            });
        }

        Ok(Self {
            app_name: env!("APP_NAME"),
            app_version: env!("APP_VERSION"),
            board_type: env!("BOARD_TYPE"),
            board_name: env!("BOARD_NAME"),

            capture: ChannelSettings {
                device: env!("CAPTURE_DEVICE"),
                sample_rate: parse("CAPTURE_SAMPLE_RATE", env!("CAPTURE_SAMPLE_RATE"))?,
                channel_format: parse("CAPTURE_CHANNEL_FORMAT", env!("CAPTURE_CHANNEL_FORMAT"))?,
                bits_per_sample: parse("CAPTURE_BITS_PER_SAMPLE", env!("CAPTURE_BITS_PER_SAMPLE"))?,
                pins: PinMap {
                    bclk: parse("CAPTURE_BCLK_PIN", env!("CAPTURE_BCLK_PIN"))?,
                    ws: parse("CAPTURE_WS_PIN", env!("CAPTURE_WS_PIN"))?,
                    data: parse("CAPTURE_DATA_PIN", env!("CAPTURE_DATA_PIN"))?,
                },
            },
            capture_frame_bytes: parse("CAPTURE_FRAME_BYTES", env!("CAPTURE_FRAME_BYTES"))?,
            capture_raw: parse("CAPTURE_RAW", env!("CAPTURE_RAW"))?,
            capture_gain: parse("CAPTURE_GAIN", env!("CAPTURE_GAIN"))?,

            playback: ChannelSettings {
                device: env!("PLAYBACK_DEVICE"),
                sample_rate: parse("PLAYBACK_SAMPLE_RATE", env!("PLAYBACK_SAMPLE_RATE"))?,
                channel_format: parse("PLAYBACK_CHANNEL_FORMAT", env!("PLAYBACK_CHANNEL_FORMAT"))?,
                bits_per_sample: parse("PLAYBACK_BITS_PER_SAMPLE", env!("PLAYBACK_BITS_PER_SAMPLE"))?,
                pins: PinMap {
                    bclk: parse("PLAYBACK_BCLK_PIN", env!("PLAYBACK_BCLK_PIN"))?,
                    ws: parse("PLAYBACK_WS_PIN", env!("PLAYBACK_WS_PIN"))?,
                    data: parse("PLAYBACK_DATA_PIN", env!("PLAYBACK_DATA_PIN"))?,
                },
            },

            transfer_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            transfer_poll_interval: Duration::from_millis(poll_ms),

            led_gpio: parse("LED_GPIO", env!("LED_GPIO"))?,
            assets_dir: PathBuf::from(env!("ASSETS_DIR")),

            recognizer_executable: env!("RECOGNIZER_EXECUTABLE"),
            recognizer_args: env!("RECOGNIZER_ARGS")
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        })
    }

    pub fn transfer_policy(&self) -> TransferPolicy {
        TransferPolicy {
            timeout: self.transfer_timeout,
            poll_interval: self.transfer_poll_interval,
        }
    }
}
