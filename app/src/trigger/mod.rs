pub mod cooldown;
pub mod matcher;

pub use cooldown::TriggerCooldown;
pub use matcher::{PhraseMatcher, TriggerMatcher};

use tracing::{debug, info};

use crate::config::TriggerConfig;

/// Decides whether a transcript should start a capture cycle. Matching
/// strategy is pluggable; the cooldown keeps the spoken answer (or an echo
/// of it) from re-triggering immediately.
pub struct TriggerDetector {
    matcher: Box<dyn TriggerMatcher>,
    cooldown: TriggerCooldown,
}

impl TriggerDetector {
    pub fn from_config(config: &TriggerConfig) -> Self {
        Self::new(
            Box::new(PhraseMatcher::new(&config.phrases)),
            TriggerCooldown::new(config.cooldown_seconds, config.cooldown_enabled),
        )
    }

    pub fn new(matcher: Box<dyn TriggerMatcher>, cooldown: TriggerCooldown) -> Self {
        Self { matcher, cooldown }
    }

    pub fn matches(&self, text: &str) -> bool {
        if !self.matcher.matches(text) {
            debug!("No trigger phrase in: '{}'", text);
            return false;
        }
        if !self.cooldown.check() {
            info!("Trigger phrase heard but suppressed by cooldown");
            return false;
        }
        info!("Trigger phrase detected in: '{}'", text);
        true
    }
}
