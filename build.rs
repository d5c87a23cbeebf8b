use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    application: Application,
    board: Board,
    capture: Channel,
    playback: Channel,
    transfer: Transfer,
    commands: Commands,
    recognizer: Recognizer,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct Board {
    #[serde(rename = "type")]
    type_: String,
    name: String,
}

#[derive(Deserialize)]
struct Channel {
    device: String,
    sample_rate: u32,
    channel_format: u32,
    bits_per_sample: u32,
    bclk_pin: u32,
    ws_pin: u32,
    data_pin: u32,
    #[serde(default = "default_frame_bytes")]
    frame_bytes: usize,
    #[serde(default)]
    raw: bool,
    #[serde(default = "default_gain")]
    gain: i32,
}

fn default_frame_bytes() -> usize {
    1024
}

fn default_gain() -> i32 {
    1
}

#[derive(Deserialize)]
struct Transfer {
    timeout_ms: u64,
    poll_interval_ms: u64,
}

#[derive(Deserialize)]
struct Commands {
    led_gpio: u32,
    assets_dir: String,
}

#[derive(Deserialize)]
struct Recognizer {
    executable: String,
    #[serde(default)]
    args: String,
}

fn emit_channel(prefix: &str, ch: &Channel) {
    println!("cargo:rustc-env={}_DEVICE={}", prefix, ch.device);
    println!("cargo:rustc-env={}_SAMPLE_RATE={}", prefix, ch.sample_rate);
    println!("cargo:rustc-env={}_CHANNEL_FORMAT={}", prefix, ch.channel_format);
    println!("cargo:rustc-env={}_BITS_PER_SAMPLE={}", prefix, ch.bits_per_sample);
    println!("cargo:rustc-env={}_BCLK_PIN={}", prefix, ch.bclk_pin);
    println!("cargo:rustc-env={}_WS_PIN={}", prefix, ch.ws_pin);
    println!("cargo:rustc-env={}_DATA_PIN={}", prefix, ch.data_pin);
}

// 在编译时读取 config.toml 并设置环境变量
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    // 应用和板子信息
    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);
    println!("cargo:rustc-env=BOARD_TYPE={}", config.board.type_);
    println!("cargo:rustc-env=BOARD_NAME={}", config.board.name);

    // 录音通道
    emit_channel("CAPTURE", &config.capture);
    println!("cargo:rustc-env=CAPTURE_FRAME_BYTES={}", config.capture.frame_bytes);
    println!("cargo:rustc-env=CAPTURE_RAW={}", config.capture.raw);
    println!("cargo:rustc-env=CAPTURE_GAIN={}", config.capture.gain);

    // 播放通道
    emit_channel("PLAYBACK", &config.playback);

    // 传输超时
    println!("cargo:rustc-env=TRANSFER_TIMEOUT_MS={}", config.transfer.timeout_ms);
    println!("cargo:rustc-env=TRANSFER_POLL_INTERVAL_MS={}", config.transfer.poll_interval_ms);

    // 命令
    println!("cargo:rustc-env=LED_GPIO={}", config.commands.led_gpio);
    println!("cargo:rustc-env=ASSETS_DIR={}", config.commands.assets_dir);

    // 识别引擎
    println!("cargo:rustc-env=RECOGNIZER_EXECUTABLE={}", config.recognizer.executable);
    println!("cargo:rustc-env=RECOGNIZER_ARGS={}", config.recognizer.args);
}
