//! Subprocess-backed collaborator implementations. Each call shells out to
//! a configured executable; a missing or failing tool surfaces as a
//! recoverable service error, never as a crash.

use shared::{DeviceError, FrameImage, ServiceError};
use std::io::Write;
use std::process::Command;
use tracing::{debug, info};

use crate::audio::AudioWindow;
use crate::config::ServicesConfig;

use super::{
    AccurateOcr, AudioPlayer, CameraFeed, FastOcr, SpeechArtifact, SpeechSynthesizer, Transcriber,
};

/// Whisper-style CLI transcriber: the window is written out as 16-bit PCM
/// WAV and the tool's stdout is taken as the transcript.
pub struct CommandTranscriber {
    program: String,
    sample_rate: u32,
}

impl CommandTranscriber {
    pub fn new(program: &str, sample_rate: u32) -> Self {
        Self {
            program: program.to_string(),
            sample_rate,
        }
    }
}

impl Transcriber for CommandTranscriber {
    fn transcribe(
        &self,
        window: &AudioWindow,
        language: &str,
    ) -> Result<Option<String>, ServiceError> {
        let wav = tempfile::Builder::new()
            .prefix("vocalens-")
            .suffix(".wav")
            .tempfile()?;
        write_wav(&window.samples, self.sample_rate, wav.as_file())?;

        let output = Command::new(&self.program)
            .arg("--language")
            .arg(language)
            .arg(wav.path())
            .output()
            .map_err(|e| ServiceError::Transcription(e.to_string()))?;

        if !output.status.success() {
            return Err(ServiceError::Transcription(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

/// Tesseract-style CLI OCR. The same adapter serves both the cheap scoring
/// pass and the accurate extraction pass; only the flags differ.
pub struct CommandOcr {
    program: String,
    args: Vec<String>,
}

impl CommandOcr {
    pub fn new(program: &str, args: &[String]) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
        }
    }

    fn run(&self, frame: &FrameImage) -> Result<String, ServiceError> {
        let image = tempfile::Builder::new()
            .prefix("vocalens-")
            .suffix(".pgm")
            .tempfile()?;
        write_pgm(frame, image.as_file())?;

        let output = Command::new(&self.program)
            .arg(image.path())
            .arg("stdout")
            .args(&self.args)
            .output()
            .map_err(|e| ServiceError::Ocr(e.to_string()))?;

        if !output.status.success() {
            return Err(ServiceError::Ocr(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl FastOcr for CommandOcr {
    fn recognize(&self, frame: &FrameImage) -> Result<String, ServiceError> {
        self.run(frame)
    }
}

impl AccurateOcr for CommandOcr {
    fn extract(&self, frame: &FrameImage) -> Result<Option<String>, ServiceError> {
        let text = self.run(frame)?;
        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

/// espeak-style synthesizer: `program -w <artifact> <text>`.
pub struct CommandSynthesizer {
    program: String,
}

impl CommandSynthesizer {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn synthesize(&self, text: &str) -> Result<SpeechArtifact, ServiceError> {
        let artifact = SpeechArtifact::reserve(".wav")?;

        let status = Command::new(&self.program)
            .arg("-w")
            .arg(artifact.path())
            .arg(text)
            .status()
            .map_err(|e| ServiceError::Synthesis(e.to_string()))?;

        if !status.success() {
            return Err(ServiceError::Synthesis(format!(
                "{} exited with {}",
                self.program, status
            )));
        }

        debug!("Synthesized {} chars to {:?}", text.len(), artifact.path());
        Ok(artifact)
    }
}

/// aplay-style playback: `program <artifact>`, blocking until done.
pub struct CommandPlayer {
    program: String,
}

impl CommandPlayer {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl AudioPlayer for CommandPlayer {
    fn play(&self, artifact: &SpeechArtifact) -> Result<(), ServiceError> {
        let status = Command::new(&self.program)
            .arg(artifact.path())
            .status()
            .map_err(|e| ServiceError::Playback(e.to_string()))?;

        if !status.success() {
            return Err(ServiceError::Playback(format!(
                "{} exited with {}",
                self.program, status
            )));
        }
        Ok(())
    }
}

/// ffmpeg-style single-frame grabber: one grayscale PGM per capture call.
pub struct CommandCamera {
    program: String,
    device: String,
    width: u32,
    height: u32,
}

impl CommandCamera {
    /// Opens the camera by grabbing a probe frame; failure here is a
    /// device error and aborts startup.
    pub fn open(services: &ServicesConfig) -> Result<Self, DeviceError> {
        let mut camera = Self {
            program: services.camera_command.clone(),
            device: services.camera_device.clone(),
            width: services.camera_width,
            height: services.camera_height,
        };

        match camera.read_frame() {
            Ok(frame) => {
                info!("Camera initialized: {}x{}", frame.width, frame.height);
                camera.width = frame.width;
                camera.height = frame.height;
                Ok(camera)
            }
            Err(e) => Err(DeviceError::CameraUnavailable(e.to_string())),
        }
    }

    fn read_frame(&mut self) -> Result<FrameImage, ServiceError> {
        let size = format!("{}x{}", self.width, self.height);
        let output = Command::new(&self.program)
            .args(["-loglevel", "error", "-f", "video4linux2", "-video_size"])
            .arg(&size)
            .arg("-i")
            .arg(&self.device)
            .args(["-frames:v", "1", "-f", "image2", "-codec:v", "pgm", "-"])
            .output()
            .map_err(|e| ServiceError::Capture(e.to_string()))?;

        if !output.status.success() {
            return Err(ServiceError::Capture(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_pgm(&output.stdout)
    }
}

impl CameraFeed for CommandCamera {
    fn capture(&mut self) -> Result<FrameImage, ServiceError> {
        self.read_frame()
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// 16-bit PCM mono WAV, 44-byte header.
pub fn write_wav(samples: &[f32], sample_rate: u32, mut out: impl Write) -> std::io::Result<()> {
    let data_len = (samples.len() * 2) as u32;
    let byte_rate = sample_rate * 2;

    out.write_all(b"RIFF")?;
    out.write_all(&(36 + data_len).to_le_bytes())?;
    out.write_all(b"WAVE")?;
    out.write_all(b"fmt ")?;
    out.write_all(&16u32.to_le_bytes())?;
    out.write_all(&1u16.to_le_bytes())?; // PCM
    out.write_all(&1u16.to_le_bytes())?; // mono
    out.write_all(&sample_rate.to_le_bytes())?;
    out.write_all(&byte_rate.to_le_bytes())?;
    out.write_all(&2u16.to_le_bytes())?; // block align
    out.write_all(&16u16.to_le_bytes())?; // bits per sample
    out.write_all(b"data")?;
    out.write_all(&data_len.to_le_bytes())?;

    for sample in samples {
        let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        out.write_all(&clamped.to_le_bytes())?;
    }
    out.flush()
}

/// Binary PGM (P5) writer for OCR input.
pub fn write_pgm(frame: &FrameImage, mut out: impl Write) -> std::io::Result<()> {
    write!(out, "P5\n{} {}\n255\n", frame.width, frame.height)?;
    out.write_all(&frame.pixels)?;
    out.flush()
}

/// Binary PGM (P5) parser for camera output.
pub fn parse_pgm(bytes: &[u8]) -> Result<FrameImage, ServiceError> {
    let bad = |msg: &str| ServiceError::Capture(format!("malformed PGM frame: {}", msg));

    let mut pos = 0usize;
    let mut next_token = |bytes: &[u8]| -> Result<(usize, usize), ServiceError> {
        let mut start = pos;
        while start < bytes.len() && bytes[start].is_ascii_whitespace() {
            start += 1;
        }
        let mut end = start;
        while end < bytes.len() && !bytes[end].is_ascii_whitespace() {
            end += 1;
        }
        if start == end {
            return Err(bad("truncated header"));
        }
        pos = end;
        Ok((start, end))
    };

    let (s, e) = next_token(bytes)?;
    if &bytes[s..e] != b"P5" {
        return Err(bad("not a P5 image"));
    }

    let mut fields = [0u32; 3];
    for field in fields.iter_mut() {
        let (s, e) = next_token(bytes)?;
        *field = std::str::from_utf8(&bytes[s..e])
            .ok()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| bad("non-numeric header field"))?;
    }
    let [width, height, maxval] = fields;
    if maxval != 255 {
        return Err(bad("unsupported max value"));
    }

    // exactly one whitespace byte separates the header from the pixels
    let data_start = pos + 1;
    let expected = (width as usize) * (height as usize);
    if bytes.len() < data_start + expected {
        return Err(bad("pixel data shorter than header claims"));
    }

    Ok(FrameImage::new(
        width,
        height,
        bytes[data_start..data_start + expected].to_vec(),
    ))
}
