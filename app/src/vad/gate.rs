use tracing::{debug, info};

use crate::audio::AudioWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowClass {
    Speech,
    Silence,
}

/// Frozen ambient-noise estimate. Built once from the calibration windows,
/// immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseProfile {
    pub floor: f32,
    pub windows_observed: usize,
}

/// Classifies audio windows as speech or silence against a calibrated
/// noise floor.
///
/// Calibration accumulates the peak amplitude of the first N non-empty
/// windows and freezes the floor at mean + 2 standard deviations. If the
/// device never produces samples the gate simply stays uncalibrated; the
/// session remains visibly in Calibrating rather than guessing a floor.
pub struct VoiceActivityGate {
    threshold: f32,
    calibration_windows: usize,
    observed_peaks: Vec<f32>,
    profile: Option<NoiseProfile>,
}

impl VoiceActivityGate {
    pub fn new(threshold: f32, calibration_windows: usize) -> Self {
        info!(
            "VAD gate initialized: threshold={:.4}, calibration_windows={}",
            threshold, calibration_windows
        );
        Self {
            threshold,
            calibration_windows: calibration_windows.max(1),
            observed_peaks: Vec::new(),
            profile: None,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.profile.is_some()
    }

    pub fn noise_profile(&self) -> Option<NoiseProfile> {
        self.profile
    }

    /// Feed one ambient window during the calibration phase. Ignored once
    /// the profile is frozen, so `is_calibrated` is monotone within a
    /// session. Empty windows do not count toward calibration.
    pub fn observe_for_calibration(&mut self, window: &AudioWindow) {
        if self.profile.is_some() {
            return;
        }
        if window.is_empty() {
            debug!("Ignoring empty window during calibration");
            return;
        }

        self.observed_peaks.push(window.peak);
        debug!(
            "Calibration window {}/{}: peak {:.4}",
            self.observed_peaks.len(),
            self.calibration_windows,
            window.peak
        );

        if self.observed_peaks.len() >= self.calibration_windows {
            self.freeze_profile();
        }
    }

    fn freeze_profile(&mut self) {
        let n = self.observed_peaks.len() as f32;
        let mean = self.observed_peaks.iter().sum::<f32>() / n;
        let variance = self
            .observed_peaks
            .iter()
            .map(|p| (p - mean) * (p - mean))
            .sum::<f32>()
            / n;
        let floor = mean + 2.0 * variance.sqrt();

        self.profile = Some(NoiseProfile {
            floor,
            windows_observed: self.observed_peaks.len(),
        });
        info!(
            "Calibration complete: noise floor {:.4} over {} windows, speech above {:.4}",
            floor,
            self.observed_peaks.len(),
            floor + self.threshold
        );
    }

    /// Classify one window. Before calibration everything is Silence so an
    /// uncalibrated gate can never push audio toward transcription.
    pub fn classify(&self, window: &AudioWindow) -> WindowClass {
        let profile = match self.profile {
            Some(p) => p,
            None => return WindowClass::Silence,
        };

        let is_speech = window.peak > profile.floor + self.threshold;
        debug!(
            "Window peak {:.4}, floor {:.4}, threshold {:.4}, speech: {}",
            window.peak, profile.floor, self.threshold, is_speech
        );

        if is_speech {
            WindowClass::Speech
        } else {
            WindowClass::Silence
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn window(samples: Vec<f32>) -> AudioWindow {
        AudioWindow::new(samples, Instant::now())
    }

    fn calibrated_gate(threshold: f32) -> VoiceActivityGate {
        let mut gate = VoiceActivityGate::new(threshold, 3);
        for _ in 0..3 {
            gate.observe_for_calibration(&window(vec![0.01, -0.01, 0.01]));
        }
        assert!(gate.is_calibrated());
        gate
    }

    #[test]
    fn test_uncalibrated_gate_classifies_silence() {
        let gate = VoiceActivityGate::new(0.02, 3);
        assert!(!gate.is_calibrated());
        assert_eq!(gate.classify(&window(vec![1.0])), WindowClass::Silence);
    }

    #[test]
    fn test_calibration_requires_n_windows() {
        let mut gate = VoiceActivityGate::new(0.02, 3);
        gate.observe_for_calibration(&window(vec![0.01]));
        gate.observe_for_calibration(&window(vec![0.01]));
        assert!(!gate.is_calibrated());
        gate.observe_for_calibration(&window(vec![0.01]));
        assert!(gate.is_calibrated());
    }

    #[test]
    fn test_empty_windows_never_calibrate() {
        let mut gate = VoiceActivityGate::new(0.02, 2);
        for _ in 0..10 {
            gate.observe_for_calibration(&window(vec![]));
        }
        assert!(!gate.is_calibrated());
    }

    #[test]
    fn test_calibration_is_monotone() {
        let mut gate = calibrated_gate(0.02);
        let before = gate.noise_profile().unwrap();

        // further observations must not reopen or move the profile
        gate.observe_for_calibration(&window(vec![0.9, 0.9]));
        assert!(gate.is_calibrated());
        assert_eq!(gate.noise_profile().unwrap(), before);
    }

    #[test]
    fn test_noise_floor_is_mean_plus_two_stddev() {
        let mut gate = VoiceActivityGate::new(0.0, 3);
        // peaks 0.1, 0.2, 0.3: mean 0.2, stddev sqrt(1/150)
        gate.observe_for_calibration(&window(vec![0.1]));
        gate.observe_for_calibration(&window(vec![0.2]));
        gate.observe_for_calibration(&window(vec![0.3]));

        let floor = gate.noise_profile().unwrap().floor;
        let expected = 0.2 + 2.0 * (1.0f32 / 150.0).sqrt();
        assert!((floor - expected).abs() < 1e-4, "floor was {}", floor);
    }

    #[test]
    fn test_below_floor_is_silence() {
        let gate = calibrated_gate(0.02);
        assert_eq!(gate.classify(&window(vec![0.005])), WindowClass::Silence);
    }

    #[test]
    fn test_above_floor_plus_threshold_is_speech() {
        let gate = calibrated_gate(0.02);
        assert_eq!(gate.classify(&window(vec![0.5, -0.4])), WindowClass::Speech);
    }

    #[test]
    fn test_between_floor_and_threshold_is_silence() {
        // constant calibration peaks: floor == peak, stddev 0
        let mut gate = VoiceActivityGate::new(0.1, 3);
        for _ in 0..3 {
            gate.observe_for_calibration(&window(vec![0.05]));
        }
        // 0.05 < peak <= floor + threshold stays silence
        assert_eq!(gate.classify(&window(vec![0.12])), WindowClass::Silence);
        assert_eq!(gate.classify(&window(vec![0.20])), WindowClass::Speech);
    }
}
