use std::io::Write;

/// Single-line terminal status display. Reads session state, never writes
/// it; transitions themselves are logged by the controller via tracing.
pub struct StatusRenderer {
    last_width: usize,
    enabled: bool,
}

impl Default for StatusRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl StatusRenderer {
    pub fn new(enabled: bool) -> Self {
        Self {
            last_width: 0,
            enabled,
        }
    }

    pub fn calibrating(&mut self, windows_observed: u64) {
        self.line(&format!(
            "[calibrating] sampling ambient noise ({} windows observed), please remain silent",
            windows_observed
        ));
    }

    pub fn monitoring(&mut self, seconds_until_window: u64) {
        self.line(&format!(
            "[monitoring] next recording window in {}s, say a trigger phrase to read text",
            seconds_until_window
        ));
    }

    pub fn searching(&mut self, frames_scanned: u64, best_score: u32) {
        self.line(&format!(
            "[capturing] searching for text... {} frames scanned, best {} words",
            frames_scanned, best_score
        ));
    }

    pub fn speaking(&mut self) {
        self.line("[speaking] reading text aloud");
    }

    fn line(&mut self, text: &str) {
        if !self.enabled {
            return;
        }
        let pad = self.last_width.saturating_sub(text.len());
        let mut out = std::io::stdout();
        let _ = write!(out, "\r{}{}", text, " ".repeat(pad));
        let _ = out.flush();
        self.last_width = text.len();
    }

    /// Finish the in-place status line before normal output resumes.
    pub fn finish(&mut self) {
        if self.enabled && self.last_width > 0 {
            let mut out = std::io::stdout();
            let _ = writeln!(out);
            let _ = out.flush();
            self.last_width = 0;
        }
    }
}
