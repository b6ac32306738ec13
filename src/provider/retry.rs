//! Retry loop shared by the HTTP providers.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use super::error::ProviderResult;

/// Run `request` up to `max_attempts` times, sleeping with exponential
/// backoff plus jitter between transient failures.
pub async fn with_retries<T, F, Fut>(
    provider: &str,
    max_attempts: u32,
    base_delay: Duration,
    mut request: F,
) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt = 0;
    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt + 1 < max_attempts => {
                tracing::debug!(provider, attempt, error = %err, "retrying request");
                tokio::time::sleep(backoff(base_delay, attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// `base * 2^attempt` plus up to a quarter of `base` as jitter.
pub fn backoff(base: Duration, attempt: u32) -> Duration {
    let base_ms = base.as_millis() as u64;
    let jitter = rand::thread_rng().gen_range(0..=base_ms / 4);
    Duration::from_millis(base_ms.saturating_mul(2_u64.saturating_pow(attempt)) + jitter)
}
