//! Exponential backoff with jitter, modeled as an attempt generator rather
//! than a sleep-and-retry loop: a caller pulls attempt numbers one at a
//! time via [`Backoff::next`], which sleeps the computed interval before
//! every attempt after the first.

use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

/// A source of jitter in `[0, 1)`. Swappable so tests can make backoff
/// timing deterministic.
pub type RandFn = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Configuration for a [`Backoff`] generator.
#[derive(Clone)]
pub struct BackoffConfig {
    max_attempts: u32,
    min_wait: Duration,
    max_wait: Duration,
    backoff_factor: f64,
    jitter_max_fraction: f64,
    rand: RandFn,
}

impl BackoffConfig {
    /// `max_attempts: 5, min_wait: 1s, max_wait: 15s, factor: 2.0, jitter: 0.2`.
    pub fn new() -> Self {
        Self {
            max_attempts: 5,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(15),
            backoff_factor: 2.0,
            jitter_max_fraction: 0.2,
            rand: Arc::new(|| rand::random::<f64>()),
        }
    }

    /// # Panics
    /// When `attempts` is `0`.
    pub fn set_max_attempts(mut self, attempts: u32) -> Self {
        assert!(attempts > 0, "max attempts must be > 0, got {attempts}");
        self.max_attempts = attempts;
        self
    }

    /// Never give up: equivalent to the original `Always()` option.
    pub fn forever(self) -> Self {
        self.set_max_attempts(u32::MAX)
    }

    /// # Panics
    /// When `wait` is zero.
    pub fn set_min_wait(mut self, wait: Duration) -> Self {
        assert!(!wait.is_zero(), "min wait must be positive");
        self.min_wait = wait;
        self
    }

    /// # Panics
    /// When `wait` is zero.
    pub fn set_max_wait(mut self, wait: Duration) -> Self {
        assert!(!wait.is_zero(), "max wait must be positive");
        self.max_wait = wait;
        self
    }

    /// # Panics
    /// When `factor < 1.0`.
    pub fn set_backoff_factor(mut self, factor: f64) -> Self {
        assert!(factor >= 1.0, "backoff factor must be >= 1.0, got {factor}");
        self.backoff_factor = factor;
        self
    }

    /// Up to what fraction of the current backoff interval is added as
    /// jitter.
    ///
    /// # Panics
    /// When `fraction` is outside `[0, 1]`.
    pub fn set_jitter_fraction(mut self, fraction: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&fraction),
            "jitter fraction must be in [0, 1], got {fraction}"
        );
        self.jitter_max_fraction = fraction;
        self
    }

    pub fn set_rand_fn(mut self, rand: RandFn) -> Self {
        self.rand = rand;
        self
    }

    /// Build a [`Backoff`] generator.
    ///
    /// # Panics
    /// When `max_wait < min_wait`.
    pub fn build(self) -> Backoff {
        assert!(
            self.max_wait >= self.min_wait,
            "max wait ({:?}) must be >= min wait ({:?})",
            self.max_wait,
            self.min_wait
        );
        Backoff {
            cfg: self,
            attempt: 1,
            pending_wait: None,
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// An attempt generator: [`Backoff::next`] yields attempt numbers starting
/// at 1, sleeping the exponentially-growing (jittered, clamped) interval
/// between each one, until `max_attempts` is reached.
pub struct Backoff {
    cfg: BackoffConfig,
    attempt: u32,
    pending_wait: Option<Duration>,
}

impl Backoff {
    pub fn with_defaults() -> Self {
        BackoffConfig::new().build()
    }

    /// Yield the next attempt number, sleeping first if a wait is pending.
    /// Returns `None` once `max_attempts` attempts have been yielded.
    pub async fn next(&mut self) -> Option<u32> {
        if self.attempt > self.cfg.max_attempts {
            return None;
        }

        if let Some(wait) = self.pending_wait.take() {
            trace!(wait_ms = wait.as_millis(), attempt = self.attempt, "backoff sleeping");
            tokio::time::sleep(wait).await;
        }

        let current = self.attempt;
        self.attempt += 1;

        if self.attempt <= self.cfg.max_attempts {
            self.pending_wait = Some(self.compute_wait(current));
        }

        Some(current)
    }

    /// Restart the sequence: the next [`Backoff::next`] call yields
    /// attempt 1 immediately, with no pending wait.
    pub fn reset(&mut self) {
        trace!("backoff reset");
        self.attempt = 1;
        self.pending_wait = None;
    }

    fn compute_wait(&self, attempt: u32) -> Duration {
        let mul = self.cfg.backoff_factor.powi(attempt as i32 - 1);
        let raw = self.cfg.min_wait.as_secs_f64() * mul;
        let jitter = (self.cfg.rand)() * self.cfg.jitter_max_fraction * raw;
        let next = (raw + jitter).clamp(self.cfg.min_wait.as_secs_f64(), self.cfg.max_wait.as_secs_f64());
        Duration::from_secs_f64(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> RandFn {
        Arc::new(|| 0.0)
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_is_immediate() {
        let mut b = BackoffConfig::new().set_rand_fn(no_jitter()).build();
        let start = tokio::time::Instant::now();
        assert_eq!(b.next().await, Some(1));
        assert_eq!(tokio::time::Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_grow_exponentially_and_clamp_to_max() {
        let mut b = BackoffConfig::new()
            .set_max_attempts(6)
            .set_min_wait(Duration::from_secs(1))
            .set_max_wait(Duration::from_secs(15))
            .set_backoff_factor(2.0)
            .set_rand_fn(no_jitter())
            .build();

        let mut waits = Vec::new();
        let mut last = tokio::time::Instant::now();
        for _ in 0..6 {
            b.next().await;
            let now = tokio::time::Instant::now();
            waits.push(now - last);
            last = now;
        }

        assert_eq!(
            waits,
            vec![
                Duration::ZERO,
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
                Duration::from_secs(15), // 16s raw, clamped to max_wait
            ]
        );
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts() {
        let mut b = BackoffConfig::new().set_max_attempts(2).build();
        assert_eq!(b.next().await, Some(1));
        assert_eq!(b.next().await, Some(2));
        assert_eq!(b.next().await, None);
        assert_eq!(b.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restarts_the_sequence_without_a_wait() {
        let mut b = BackoffConfig::new().set_rand_fn(no_jitter()).build();
        assert_eq!(b.next().await, Some(1));
        b.next().await; // attempt 2, now has a pending wait queued for 3
        b.reset();

        let start = tokio::time::Instant::now();
        assert_eq!(b.next().await, Some(1));
        assert_eq!(tokio::time::Instant::now(), start);
    }

    #[test]
    #[should_panic(expected = "max attempts must be > 0")]
    fn zero_max_attempts_panics() {
        BackoffConfig::new().set_max_attempts(0);
    }

    #[test]
    #[should_panic(expected = "must be >= min wait")]
    fn max_wait_below_min_wait_panics_on_build() {
        BackoffConfig::new()
            .set_min_wait(Duration::from_secs(10))
            .set_max_wait(Duration::from_secs(1))
            .build();
    }
}
