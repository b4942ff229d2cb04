//! Bounded polling for artifacts produced by an already-finished process

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use tryon_core::PoseConfig;

/// Source of delays between poll attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("condition not met after {attempts} attempts")]
pub struct PollExhausted {
    pub attempts: u32,
}

/// Check a condition at most `attempts` times, `interval` apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedPoll {
    pub attempts: u32,
    pub interval: Duration,
}

impl BoundedPoll {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    pub fn from_config(config: &PoseConfig) -> Self {
        Self::new(config.poll_attempts, config.poll_interval())
    }

    /// Run `probe` until it yields a value.
    ///
    /// `probe` receives the 1-based attempt number. The sleeper is awaited
    /// between attempts only, so a budget of `n` costs `n - 1` sleeps.
    pub async fn run<T, F, Fut>(&self, sleeper: &dyn Sleeper, mut probe: F) -> Result<T, PollExhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        for attempt in 1..=self.attempts {
            if let Some(value) = probe(attempt).await {
                debug!("Poll satisfied on attempt {}/{}", attempt, self.attempts);
                return Ok(value);
            }
            debug!("Poll attempt {}/{} found nothing", attempt, self.attempts);
            if attempt < self.attempts {
                sleeper.sleep(self.interval).await;
            }
        }

        Err(PollExhausted {
            attempts: self.attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSleeper {
        calls: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.calls.lock().push(duration);
        }
    }

    #[test]
    fn test_poll_immediate_success() {
        let sleeper = RecordingSleeper::default();
        let poll = BoundedPoll::new(10, Duration::from_secs(1));
        let result = tokio_test::block_on(poll.run(&sleeper, |_| async { Some("found") }));
        assert_eq!(result, Ok("found"));
        assert!(sleeper.calls.lock().is_empty());
    }

    #[test]
    fn test_poll_success_on_third_attempt() {
        let sleeper = RecordingSleeper::default();
        let poll = BoundedPoll::new(10, Duration::from_millis(250));
        let mut seen = Vec::new();
        let result = tokio_test::block_on(poll.run(&sleeper, |attempt| {
            seen.push(attempt);
            async move { (attempt == 3).then_some(attempt) }
        }));
        assert_eq!(result, Ok(3));
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(*sleeper.calls.lock(), vec![Duration::from_millis(250); 2]);
    }

    #[test]
    fn test_poll_exhausts_exact_budget() {
        let sleeper = RecordingSleeper::default();
        let poll = BoundedPoll::new(10, Duration::from_secs(1));
        let mut probes = 0u32;
        let result: Result<(), _> = tokio_test::block_on(poll.run(&sleeper, |_| {
            probes += 1;
            async { None }
        }));
        assert_eq!(result, Err(PollExhausted { attempts: 10 }));
        assert_eq!(probes, 10);
        assert_eq!(sleeper.calls.lock().len(), 9);
    }

    #[test]
    fn test_poll_zero_budget_never_probes() {
        let sleeper = RecordingSleeper::default();
        let poll = BoundedPoll::new(0, Duration::from_secs(1));
        let mut probes = 0u32;
        let result: Result<(), _> = tokio_test::block_on(poll.run(&sleeper, |_| {
            probes += 1;
            async { None }
        }));
        assert_eq!(result, Err(PollExhausted { attempts: 0 }));
        assert_eq!(probes, 0);
    }

    #[test]
    fn test_poll_from_config() {
        let config = PoseConfig {
            poll_attempts: 4,
            poll_interval_ms: 50,
            ..PoseConfig::default()
        };
        let poll = BoundedPoll::from_config(&config);
        assert_eq!(poll, BoundedPoll::new(4, Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_poll_awaits_async_probe() {
        let sleeper = RecordingSleeper::default();
        let poll = BoundedPoll::new(3, Duration::from_millis(5));
        let result = poll
            .run(&sleeper, |attempt| async move {
                let found = tokio::task::spawn_blocking(move || attempt == 2).await.unwrap();
                found.then_some(attempt)
            })
            .await;
        assert_eq!(result, Ok(2));
        assert_eq!(sleeper.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_tokio_sleeper_waits() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
