use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use vocalens::audio::{ContinuousRecorder, MicrophoneCapture};
use vocalens::config;
use vocalens::services::external::{
    CommandCamera, CommandOcr, CommandPlayer, CommandSynthesizer, CommandTranscriber,
};
use vocalens::services::share_camera;
use vocalens::session::{SessionController, SessionServices, StatusRenderer};
use vocalens::trigger::TriggerDetector;
use vocalens::vad::VoiceActivityGate;
use vocalens::vision::{BestFrameSelector, FrameScorer};

#[derive(Parser)]
#[command(name = "vocalens")]
#[command(about = "Voice-triggered camera text reader: ask what is written, hear it back")]
struct Cli {
    /// Path to a config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the recognition language code
    #[arg(long)]
    language: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()))
        .init();

    let cli = Cli::parse();
    let mut config = config::load_config(cli.config)?;
    if let Some(language) = cli.language {
        config.recognition.language = language;
    }
    if cli.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    info!("vocalens starting...");

    // Devices first: losing either is the only fatal startup error.
    let camera = share_camera(CommandCamera::open(&config.services)?);
    let mut microphone = MicrophoneCapture::new(&config.audio)?;

    let (chunk_tx, chunk_rx) = broadcast::channel(config.buffer.broadcast_capacity.max(1));
    microphone.start(chunk_tx)?;

    let gate = VoiceActivityGate::new(config.vad.threshold, config.vad.calibration_windows);
    let transcriber = Arc::new(CommandTranscriber::new(
        &config.services.transcriber_command,
        config.audio.sample_rate,
    ));
    let recorder = ContinuousRecorder::new(&config, gate, transcriber).spawn(chunk_rx);

    let scorer = FrameScorer::new(Arc::new(CommandOcr::new(
        &config.services.fast_ocr_command,
        &config.services.fast_ocr_args,
    )));
    let selector = BestFrameSelector::new(
        scorer,
        Duration::from_secs(config.capture.window_seconds),
        Duration::from_millis(config.capture.frame_retry_ms),
    );
    let trigger = TriggerDetector::from_config(&config.trigger);
    let services = SessionServices {
        accurate_ocr: Arc::new(CommandOcr::new(
            &config.services.accurate_ocr_command,
            &config.services.accurate_ocr_args,
        )),
        synthesizer: Arc::new(CommandSynthesizer::new(&config.services.synthesizer_command)),
        player: Arc::new(CommandPlayer::new(&config.services.player_command)),
    };

    let (quit_tx, quit_rx) = watch::channel(false);
    spawn_quit_watchers(quit_tx);

    let (controller, _state_rx) = SessionController::new(
        &config,
        trigger,
        selector,
        services,
        StatusRenderer::default(),
    );

    println!(
        "Say '{}' to read text aloud. Press 'q' then Enter (or Ctrl-C) to quit.",
        config
            .trigger
            .phrases
            .first()
            .map(String::as_str)
            .unwrap_or("a trigger phrase")
    );

    controller.run(camera, recorder, quit_rx).await?;

    microphone.stop();
    info!("Shutdown complete");
    Ok(())
}

fn spawn_quit_watchers(quit_tx: watch::Sender<bool>) {
    let keyboard_tx = quit_tx.clone();
    tokio::spawn(async move {
        use tokio::io::AsyncBufReadExt;
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().eq_ignore_ascii_case("q") {
                info!("Quit requested from keyboard");
                let _ = keyboard_tx.send(true);
                break;
            }
        }
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Quit requested via Ctrl-C");
            let _ = quit_tx.send(true);
        }
    });
}
