use std::time::Instant;

/// One fixed-duration buffer of microphone samples, owned by the recorder
/// until it is handed to the gate or a transcription task.
#[derive(Debug, Clone)]
pub struct AudioWindow {
    pub samples: Vec<f32>,
    pub started_at: Instant,
    pub peak: f32,
}

impl AudioWindow {
    pub fn new(samples: Vec<f32>, started_at: Instant) -> Self {
        let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        Self {
            samples,
            started_at,
            peak,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Window length derived from the sample count, for logging.
    pub fn duration_ms(&self, sample_rate: u32) -> u64 {
        if sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / sample_rate as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_peak_is_absolute_maximum() {
        let window = AudioWindow::new(vec![0.1, -0.8, 0.3], Instant::now());
        assert_eq!(window.peak, 0.8);
    }

    #[test]
    fn test_empty_window() {
        let window = AudioWindow::new(vec![], Instant::now());
        assert!(window.is_empty());
        assert_eq!(window.peak, 0.0);
    }

    #[test]
    fn test_duration_ms() {
        let window = AudioWindow::new(vec![0.0; 16000], Instant::now());
        assert_eq!(window.duration_ms(16000), 1000);
        assert_eq!(window.duration_ms(0), 0);
    }
}
