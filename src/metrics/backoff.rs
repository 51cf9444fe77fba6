use std::time::Duration;

/// Number of consecutive failures after which the collector reports at error level.
pub const ESCALATE_AFTER: u32 = 5;

/// Retry delay for the collector loop: doubles per consecutive failure up to `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
    consecutive_failures: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.max(Duration::from_millis(1));
        Self {
            initial,
            max: max.max(initial),
            current: initial,
            consecutive_failures: 0,
        }
    }

    /// Record a failure and return how long to wait before retrying.
    pub fn mark_failure(&mut self) -> Duration {
        let delay = self.current;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.current = (self.current * 2).min(self.max);
        delay
    }

    /// Reset after a successful pass.
    pub fn mark_success(&mut self) {
        self.current = self.initial;
        self.consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether the failure streak is long enough to need operator attention.
    pub fn is_escalated(&self) -> bool {
        self.consecutive_failures >= ESCALATE_AFTER
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(crate::DEFAULT_BACKOFF_MS),
            Duration::from_millis(crate::DEFAULT_MAX_BACKOFF_MS),
        )
    }
}
