use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub vad: VadConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub services: ServicesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AudioConfig {
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
    #[serde(default = "default_gain")]
    pub gain: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            gain: default_gain(),
        }
    }
}

fn default_device() -> String {
    "default".to_string()
}
fn default_sample_rate() -> u32 {
    16000
}
fn default_channels() -> u16 {
    1
}
fn default_gain() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct VadConfig {
    /// Sensitivity margin above the calibrated noise floor. A window whose
    /// peak amplitude exceeds floor + threshold is classified Speech.
    #[serde(default = "default_vad_threshold")]
    pub threshold: f32,
    /// Number of ambient windows that must be observed before the noise
    /// floor is frozen.
    #[serde(default = "default_calibration_windows")]
    pub calibration_windows: usize,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            threshold: default_vad_threshold(),
            calibration_windows: default_calibration_windows(),
        }
    }
}

fn default_vad_threshold() -> f32 {
    0.02
}
fn default_calibration_windows() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RecordingConfig {
    /// One audio window is closed per this many seconds of wall clock.
    #[serde(default = "default_recording_interval")]
    pub interval_seconds: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_recording_interval(),
        }
    }
}

fn default_recording_interval() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RecognitionConfig {
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

fn default_language() -> String {
    "en-US".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CaptureConfig {
    /// Wall-clock duration of the best-frame search window.
    #[serde(default = "default_capture_window")]
    pub window_seconds: u64,
    /// Back-off before retrying after a failed camera read.
    #[serde(default = "default_frame_retry_ms")]
    pub frame_retry_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_capture_window(),
            frame_retry_ms: default_frame_retry_ms(),
        }
    }
}

fn default_capture_window() -> u64 {
    10
}
fn default_frame_retry_ms() -> u64 {
    250
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TriggerConfig {
    #[serde(default = "default_trigger_phrases")]
    pub phrases: Vec<String>,
    /// A second trigger match within this period is ignored, so the spoken
    /// answer cannot re-trigger its own capture.
    #[serde(default = "default_trigger_cooldown")]
    pub cooldown_seconds: u64,
    #[serde(default = "default_cooldown_enabled")]
    pub cooldown_enabled: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            phrases: default_trigger_phrases(),
            cooldown_seconds: default_trigger_cooldown(),
            cooldown_enabled: default_cooldown_enabled(),
        }
    }
}

fn default_trigger_phrases() -> Vec<String> {
    vec![
        "what is written here".to_string(),
        "what is written there".to_string(),
    ]
}
fn default_trigger_cooldown() -> u64 {
    30
}
fn default_cooldown_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TimeoutsConfig {
    #[serde(default = "default_transcription_timeout")]
    pub transcription_seconds: u64,
    #[serde(default = "default_synthesis_timeout")]
    pub synthesis_seconds: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            transcription_seconds: default_transcription_timeout(),
            synthesis_seconds: default_synthesis_timeout(),
        }
    }
}

fn default_transcription_timeout() -> u64 {
    30
}
fn default_synthesis_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BufferConfig {
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    #[serde(default = "default_transcript_capacity")]
    pub transcript_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: default_broadcast_capacity(),
            transcript_capacity: default_transcript_capacity(),
        }
    }
}

fn default_broadcast_capacity() -> usize {
    100
}
fn default_transcript_capacity() -> usize {
    32
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RenderConfig {
    /// Monitoring countdown refresh cadence.
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            refresh_ms: default_refresh_ms(),
        }
    }
}

fn default_refresh_ms() -> u64 {
    1000
}

/// External collaborator commands. Each is an executable invoked per call;
/// a missing or failing tool is a recoverable service error, never fatal.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServicesConfig {
    #[serde(default = "default_transcriber_command")]
    pub transcriber_command: String,
    #[serde(default = "default_fast_ocr_command")]
    pub fast_ocr_command: String,
    #[serde(default = "default_fast_ocr_args")]
    pub fast_ocr_args: Vec<String>,
    #[serde(default = "default_accurate_ocr_command")]
    pub accurate_ocr_command: String,
    #[serde(default = "default_accurate_ocr_args")]
    pub accurate_ocr_args: Vec<String>,
    #[serde(default = "default_synthesizer_command")]
    pub synthesizer_command: String,
    #[serde(default = "default_player_command")]
    pub player_command: String,
    #[serde(default = "default_camera_command")]
    pub camera_command: String,
    #[serde(default = "default_camera_device")]
    pub camera_device: String,
    #[serde(default = "default_camera_width")]
    pub camera_width: u32,
    #[serde(default = "default_camera_height")]
    pub camera_height: u32,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            transcriber_command: default_transcriber_command(),
            fast_ocr_command: default_fast_ocr_command(),
            fast_ocr_args: default_fast_ocr_args(),
            accurate_ocr_command: default_accurate_ocr_command(),
            accurate_ocr_args: default_accurate_ocr_args(),
            synthesizer_command: default_synthesizer_command(),
            player_command: default_player_command(),
            camera_command: default_camera_command(),
            camera_device: default_camera_device(),
            camera_width: default_camera_width(),
            camera_height: default_camera_height(),
        }
    }
}

fn default_transcriber_command() -> String {
    "whisper-cli".to_string()
}
fn default_fast_ocr_command() -> String {
    "tesseract".to_string()
}
fn default_fast_ocr_args() -> Vec<String> {
    vec!["--psm".to_string(), "6".to_string()]
}
fn default_accurate_ocr_command() -> String {
    "tesseract".to_string()
}
fn default_accurate_ocr_args() -> Vec<String> {
    vec!["--psm".to_string(), "3".to_string()]
}
fn default_synthesizer_command() -> String {
    "espeak-ng".to_string()
}
fn default_player_command() -> String {
    "aplay".to_string()
}
fn default_camera_command() -> String {
    "ffmpeg".to_string()
}
fn default_camera_device() -> String {
    "/dev/video0".to_string()
}
fn default_camera_width() -> u32 {
    640
}
fn default_camera_height() -> u32 {
    480
}

pub fn load_config(override_path: Option<PathBuf>) -> Result<Config> {
    let config_path = match override_path {
        Some(path) => path,
        None => default_config_path()?,
    };

    if !config_path.exists() {
        tracing::info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(Config::default());
    }

    tracing::info!("Loading config from {:?}", config_path);
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

    tracing::info!("Config loaded successfully");
    Ok(config)
}

fn default_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("No config directory available"))?;
    Ok(dir.join("vocalens").join("config.toml"))
}
