use std::time::Duration;

pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(1_000);
pub const DEFAULT_BACKOFF_MULTIPLIER: u32 = 2;
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_millis(30_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub multiplier: u32,
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: DEFAULT_INITIAL_BACKOFF,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl BackoffPolicy {
    fn grow(&self, current: Duration) -> Duration {
        current
            .checked_mul(self.multiplier.max(1))
            .map_or(self.max, |next| next.min(self.max))
    }
}

/// Reconnect delay state. Only a successful connection resets it.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            current: policy.initial.min(policy.max),
            policy,
        }
    }

    /// Delay to wait before the next attempt. Advances the state for the attempt after.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.policy.grow(self.current);
        delay
    }

    pub fn peek(&self) -> Duration {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = self.policy.initial.min(self.policy.max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(delays: impl IntoIterator<Item = Duration>) -> Vec<u128> {
        delays.into_iter().map(|d| d.as_millis()).collect()
    }

    #[test]
    fn default_sequence_doubles_then_caps() {
        let mut backoff = Backoff::new(BackoffPolicy::default());
        let delays: Vec<Duration> = (0..8).map(|_| backoff.next_delay()).collect();
        assert_eq!(
            millis(delays),
            vec![1_000, 2_000, 4_000, 8_000, 16_000, 30_000, 30_000, 30_000]
        );
    }

    #[test]
    fn reset_restarts_from_initial() {
        let mut backoff = Backoff::new(BackoffPolicy::default());
        for _ in 0..4 {
            backoff.next_delay();
        }
        assert_eq!(backoff.peek(), Duration::from_millis(16_000));
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(1_000));
        assert_eq!(backoff.next_delay(), Duration::from_millis(2_000));
    }

    #[test]
    fn initial_above_cap_is_clamped() {
        let mut backoff = Backoff::new(BackoffPolicy {
            initial: Duration::from_secs(60),
            multiplier: 2,
            max: Duration::from_secs(5),
        });
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
    }

    #[test]
    fn multiplier_of_zero_behaves_as_constant_delay() {
        let mut backoff = Backoff::new(BackoffPolicy {
            initial: Duration::from_millis(250),
            multiplier: 0,
            max: Duration::from_secs(1),
        });
        assert_eq!(
            millis([backoff.next_delay(), backoff.next_delay()]),
            vec![250, 250]
        );
    }
}
