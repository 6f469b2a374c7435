use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use shared::DeviceError;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::config::AudioConfig;

/// Exclusive owner of the microphone handle. Pushes raw sample chunks into
/// a broadcast channel consumed by the continuous recorder; never blocks on
/// anything downstream.
pub struct MicrophoneCapture {
    device: Device,
    stream: Option<Box<Stream>>,
    config: AudioConfig,
    chunk_tx: Arc<Mutex<Option<broadcast::Sender<Vec<f32>>>>>,
    is_running: Arc<Mutex<bool>>,
}

impl MicrophoneCapture {
    pub fn new(config: &AudioConfig) -> Result<Self, DeviceError> {
        let host = cpal::default_host();

        let device = if config.device.is_empty() || config.device == "default" {
            host.default_input_device()
                .ok_or(DeviceError::MicrophoneUnavailable)?
        } else {
            host.input_devices()
                .map_err(|e| DeviceError::AudioConfig(e.to_string()))?
                .find(|d| d.name().map(|n| n == config.device).unwrap_or(false))
                .ok_or(DeviceError::MicrophoneUnavailable)?
        };

        tracing::info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "unknown".to_string())
        );

        Ok(Self {
            device,
            stream: None,
            config: config.clone(),
            chunk_tx: Arc::new(Mutex::new(None)),
            is_running: Arc::new(Mutex::new(false)),
        })
    }

    pub fn start(&mut self, chunk_tx: broadcast::Sender<Vec<f32>>) -> Result<(), DeviceError> {
        *self.chunk_tx.lock().unwrap() = Some(chunk_tx);
        *self.is_running.lock().unwrap() = true;

        let stream_config = self.pick_stream_config()?;
        tracing::info!(
            "Configuring audio stream: {}Hz, {} channel(s)",
            stream_config.sample_rate.0,
            stream_config.channels
        );

        let sample_format = self
            .device
            .default_input_config()
            .map(|c| c.sample_format())
            .unwrap_or(SampleFormat::F32);

        let chunk_tx = Arc::clone(&self.chunk_tx);
        let is_running = Arc::clone(&self.is_running);
        let error_callback = |err| {
            tracing::error!("Audio stream error: {}", err);
        };

        let stream: Box<Stream> = match sample_format {
            SampleFormat::F32 => Box::new(
                self.device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[f32], _: &_| {
                            Self::forward_chunk(data, &chunk_tx, &is_running);
                        },
                        error_callback,
                        None,
                    )
                    .map_err(|e| DeviceError::AudioConfig(e.to_string()))?,
            ),
            SampleFormat::I16 => Box::new(
                self.device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[i16], _: &_| {
                            let converted: Vec<f32> =
                                data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                            Self::forward_chunk(&converted, &chunk_tx, &is_running);
                        },
                        error_callback,
                        None,
                    )
                    .map_err(|e| DeviceError::AudioConfig(e.to_string()))?,
            ),
            SampleFormat::U16 => Box::new(
                self.device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[u16], _: &_| {
                            let converted: Vec<f32> = data
                                .iter()
                                .map(|&s| (s as i32 - (u16::MAX as i32 / 2)) as f32
                                    / (i16::MAX as f32))
                                .collect();
                            Self::forward_chunk(&converted, &chunk_tx, &is_running);
                        },
                        error_callback,
                        None,
                    )
                    .map_err(|e| DeviceError::AudioConfig(e.to_string()))?,
            ),
            format => {
                return Err(DeviceError::AudioConfig(format!(
                    "unsupported sample format: {:?}",
                    format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| DeviceError::AudioConfig(e.to_string()))?;
        self.stream = Some(stream);

        tracing::info!("Microphone capture started");
        Ok(())
    }

    fn pick_stream_config(&self) -> Result<StreamConfig, DeviceError> {
        let supported = self
            .device
            .supported_input_configs()
            .map_err(|e| DeviceError::AudioConfig(e.to_string()))?;

        for candidate in supported {
            if candidate.channels() == self.config.channels
                && candidate.min_sample_rate().0 <= self.config.sample_rate
                && candidate.max_sample_rate().0 >= self.config.sample_rate
            {
                return Ok(candidate
                    .with_sample_rate(cpal::SampleRate(self.config.sample_rate))
                    .into());
            }
        }

        Err(DeviceError::AudioConfig(format!(
            "no input config for {}Hz / {} channel(s)",
            self.config.sample_rate, self.config.channels
        )))
    }

    fn forward_chunk(
        data: &[f32],
        chunk_tx: &Arc<Mutex<Option<broadcast::Sender<Vec<f32>>>>>,
        is_running: &Arc<Mutex<bool>>,
    ) {
        // try_lock: the audio callback must never wait on the control side
        if is_running.try_lock().map(|g| *g).unwrap_or(false) {
            if let Ok(tx) = chunk_tx.try_lock() {
                if let Some(sender) = tx.as_ref() {
                    let _ = sender.send(data.to_vec());
                }
            }
        }
    }

    pub fn stop(&mut self) {
        *self.is_running.lock().unwrap() = false;
        if let Some(stream) = self.stream.take() {
            drop(stream);
        }
        *self.chunk_tx.lock().unwrap() = None;

        tracing::info!("Microphone capture stopped");
    }
}

// cpal::Stream is !Send; the stream is only ever touched from the thread
// that created it, the shared handles above are all Sync.
unsafe impl Send for MicrophoneCapture {}
