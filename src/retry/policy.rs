use std::time::Duration;

use rand::Rng;

/// Exponential backoff with a cap and symmetric jitter.
///
/// The policy itself is stateless; each executor invocation owns its own
/// attempt counter, so every new logical call starts again from
/// `base_delay` and concurrent calls cannot perturb each other's delay
/// sequences.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on the pre-jitter delay.
    pub max_delay: Duration,
    /// Geometric growth factor per attempt.
    pub multiplier: f64,
    /// Symmetric jitter fraction (0.25 = ±25%), applied after capping.
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            multiplier: 1.6,
            jitter: 0.25,
        }
    }
}

impl BackoffPolicy {
    /// Compute the delay before retrying after `attempt` failures
    /// (`attempt` is 0-based: 0 = delay after the first failure).
    ///
    /// `base * multiplier^attempt`, capped at `max_delay`, then jittered.
    /// The jitter spreads concurrent callers so their retries do not land
    /// in lockstep. Computed in f64 seconds and capped before a `Duration`
    /// is built, so an aggressive multiplier or high attempt count can
    /// never overflow.
    pub fn delay(&self, attempt: u32) -> Duration {
        let max_secs = self.max_delay.as_secs_f64();
        let base_secs = self.base_delay.as_secs_f64();
        let raw_secs = (base_secs * self.multiplier.max(1.0).powi(attempt.min(i32::MAX as u32) as i32))
            .min(max_secs);
        let factor = 1.0 + self.jitter.clamp(0.0, 1.0) * rand::thread_rng().gen_range(-1.0..=1.0);
        Duration::try_from_secs_f64((raw_secs * factor).max(0.0)).unwrap_or(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_two_delays_within_jitter_bounds() {
        let p = BackoffPolicy::default();
        for _ in 0..100 {
            let d0 = p.delay(0);
            // 500ms ± 25%
            assert!(d0 >= Duration::from_millis(375), "d0 = {:?}", d0);
            assert!(d0 <= Duration::from_millis(625), "d0 = {:?}", d0);
            let d1 = p.delay(1);
            // 800ms ± 25%
            assert!(d1 >= Duration::from_millis(600), "d1 = {:?}", d1);
            assert!(d1 <= Duration::from_millis(1000), "d1 = {:?}", d1);
        }
    }

    #[test]
    fn growth_is_capped() {
        let p = BackoffPolicy::default();
        let ceiling = p.max_delay.mul_f64(1.0 + p.jitter);
        for attempt in 0..40 {
            assert!(p.delay(attempt) <= ceiling);
        }
        // well past the cap, the pre-jitter delay pins to max_delay
        let floor = p.max_delay.mul_f64(1.0 - p.jitter);
        for _ in 0..50 {
            assert!(p.delay(30) >= floor);
        }
    }

    #[test]
    fn zero_jitter_is_deterministic() {
        let p = BackoffPolicy {
            jitter: 0.0,
            ..BackoffPolicy::default()
        };
        assert_eq!(p.delay(0), Duration::from_millis(500));
        assert_eq!(p.delay(1), Duration::from_millis(800));
        assert_eq!(p.delay(2), Duration::from_millis(1280));
    }

    #[test]
    fn aggressive_multiplier_stays_capped() {
        let p = BackoffPolicy {
            multiplier: 3.0,
            ..BackoffPolicy::default()
        };
        let ceiling = p.max_delay.mul_f64(1.0 + p.jitter);
        for attempt in [0, 1, 10, 64, 1000, u32::MAX] {
            assert!(p.delay(attempt) <= ceiling, "attempt = {attempt}");
        }
    }

    #[test]
    fn huge_max_delay_does_not_overflow() {
        let p = BackoffPolicy {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::MAX,
            multiplier: 2.0,
            jitter: 0.25,
        };
        // jitter above an un-representable cap falls back to max_delay
        let d = p.delay(u32::MAX);
        assert!(d > Duration::ZERO);
    }

    #[test]
    fn zero_base_yields_zero_delay() {
        let p = BackoffPolicy {
            base_delay: Duration::ZERO,
            ..BackoffPolicy::default()
        };
        // degenerate config still yields a valid (zero) duration
        assert_eq!(p.delay(5), Duration::ZERO);
    }
}
