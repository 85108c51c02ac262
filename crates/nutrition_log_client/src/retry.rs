use rand::{Rng, rng};
use std::time::Duration;

/// A simple retry policy with exponential backoff and jitter.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub async fn retry_async<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.retry_async_if(|_| true, f).await
    }

    /// Like [`retry_async`](Self::retry_async) but gives up immediately on
    /// errors for which `should_retry` returns `false`.
    pub async fn retry_async_if<P, F, Fut, T, E>(&self, should_retry: P, mut f: F) -> Result<T, E>
    where
        P: Fn(&E) -> bool,
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let mut attempt = 0u32;
        loop {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries || !should_retry(&e) {
                        return Err(e);
                    }
                    // exponential backoff with jitter
                    let max_delay = self.base_delay.saturating_mul(1u32 << attempt.min(16));
                    let max_ms = max_delay.as_millis() as u64;
                    if max_ms > 0 {
                        let jitter = rng().random_range(0..max_ms);
                        tokio::time::sleep(Duration::from_millis(jitter)).await;
                    }
                }
            }
        }
    }
}
