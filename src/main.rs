use std::path::Path;

use tokio::signal;

use voice_command_rs::audio::{AlsaHal, AudioChannelManager, SampleConditioner, ShutdownSignal};
use voice_command_rs::commands::{AudioClip, CommandRegistry, FeedbackClips, SysfsPin};
use voice_command_rs::{Config, RecognizerLink, VoiceSession};

// 读取原始 PCM 提示音，缺失时用空音频代替，播放时会被拒绝并记录日志
fn load_clip(dir: &Path, name: &'static str) -> AudioClip {
    let path = dir.join(format!("{}.pcm", name));
    match std::fs::read(&path) {
        Ok(pcm) => {
            log::info!("Loaded clip {} ({} bytes)", path.display(), pcm.len());
            AudioClip::new(name, pcm)
        }
        Err(e) => {
            log::warn!("Failed to load clip {}: {}", path.display(), e);
            AudioClip::empty(name)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 加载配置
    let config = Config::new()?;
    log::info!(
        "{} v{} on {} ({})",
        config.app_name,
        config.app_version,
        config.board_name,
        config.board_type,
    );

    let shutdown = ShutdownSignal::new();

    // 初始化音频通道：麦克风 + 功放
    let hal = AlsaHal::new(config.capture.device, config.playback.device);
    let mut audio = AudioChannelManager::new(
        Box::new(hal),
        config.capture.pins,
        config.playback.pins,
        config.transfer_policy(),
        shutdown.clone(),
    )
    .with_conditioner(SampleConditioner::with_gain(config.capture_gain));
    audio.init_capture(
        config.capture.sample_rate,
        config.capture.channel_format,
        config.capture.bits_per_sample,
    )?;
    audio.init_playback(
        config.playback.sample_rate,
        config.playback.channel_format,
        config.playback.bits_per_sample,
    )?;

    // 注册命令
    let led = SysfsPin::export(config.led_gpio)?;
    let clips = FeedbackClips {
        light_on: load_clip(&config.assets_dir, "light_on"),
        light_off: load_clip(&config.assets_dir, "light_off"),
        farewell: load_clip(&config.assets_dir, "byebye"),
    };
    let registry = CommandRegistry::with_builtin_commands(Box::new(led.clone()), Box::new(led), clips)?;

    // 启动识别引擎并同步命令词
    let recognizer = RecognizerLink::spawn(config.recognizer_executable, &config.recognizer_args)?;
    let mut session = VoiceSession::new(
        audio,
        registry,
        Box::new(recognizer),
        shutdown.clone(),
        config.capture_frame_bytes,
        config.capture_raw,
    );
    let report = session.sync_vocabulary()?;
    if !report.is_complete() {
        log::warn!("{} command phrases could not be registered", report.failed);
    }

    // Ctrl+C 只置位停止标志，音频循环在下一个等待片段内退出
    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            log::info!("Received Ctrl+C, shutting down...");
            ctrl_c_shutdown.trigger();
        }
    });

    // 阻塞的音频循环放在独立线程里跑
    let result = tokio::task::spawn_blocking(move || session.run()).await?;

    match result {
        Ok(end) => log::info!("Session ended: {:?}", end),
        Err(e) => {
            log::error!("Session failed: {}", e);
            return Err(e.into());
        }
    }
    Ok(())
}
