use std::time::Duration;

/// How often, and how patiently, idempotent requests are retried.
///
/// The delay doubles after every failed attempt: with a backoff of 200ms the
/// waits are 200ms, 400ms, 800ms, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Anything below 1 means 1.
    pub max_attempts: u32,
    pub backoff: Duration,
}
impl RetryPolicy {
    /// Never retry.
    pub const NONE: Self = Self { max_attempts: 1, backoff: Duration::ZERO };

    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff }
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before the attempt following `attempt` (1-based).
    pub(crate) fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}
impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(200))
    }
}
