use governor::{clock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

/// Refire guard for the trigger detector. One activation is allowed, then
/// further matches are rejected until the cooldown period has elapsed.
/// Token bucket via the governor crate.
pub struct TriggerCooldown {
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, clock::DefaultClock>>,
    enabled: bool,
}

impl TriggerCooldown {
    /// A `cooldown_seconds` of 0 disables the guard, as does
    /// `enabled = false`.
    pub fn new(cooldown_seconds: u64, enabled: bool) -> Self {
        let limiter = Quota::with_period(Duration::from_secs(cooldown_seconds))
            .map(|quota| quota.allow_burst(NonZeroU32::new(1).expect("1 is non-zero")))
            .map(RateLimiter::direct);

        Self { limiter, enabled }
    }

    /// Immediate check: true when a trigger activation may proceed. The
    /// permitted activation consumes the bucket.
    pub fn check(&self) -> bool {
        if !self.enabled {
            return true;
        }
        match &self.limiter {
            Some(limiter) => limiter.check().is_ok(),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_activation_allowed() {
        let cooldown = TriggerCooldown::new(30, true);
        assert!(cooldown.check());
    }

    #[test]
    fn test_second_activation_rejected_within_period() {
        let cooldown = TriggerCooldown::new(60, true);
        assert!(cooldown.check());
        assert!(!cooldown.check());
    }

    #[test]
    fn test_disabled_always_allows() {
        let cooldown = TriggerCooldown::new(60, false);
        for _ in 0..5 {
            assert!(cooldown.check());
        }
    }

    #[test]
    fn test_zero_period_always_allows() {
        let cooldown = TriggerCooldown::new(0, true);
        for _ in 0..5 {
            assert!(cooldown.check());
        }
    }
}
