//! Outbound Retry
//!
//! Enrichment calls (geocoding, analyst) get exactly one retry after a
//! fixed backoff. Failures after that are reported, never escalated.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::constants::ENRICHMENT_RETRY_BACKOFF_MS;

pub fn default_backoff() -> Duration {
    Duration::from_millis(ENRICHMENT_RETRY_BACKOFF_MS)
}

/// Run `op`; on error wait `backoff` and run it once more
pub async fn retry_once<T, E, F, Fut>(label: &str, backoff: Duration, mut op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(e) => {
            log::warn!("{} failed ({}), retrying in {:?}", label, e, backoff);
            tokio::time::sleep(backoff).await;
            op().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_second_attempt_succeeds() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<u32, String> = retry_once("test", Duration::from_millis(1), || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("transient".to_string())
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_one_retry() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<u32, String> = retry_once("test", Duration::from_millis(1), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("down".to_string())
        })
        .await;

        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_success_is_not_retried() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: Result<u32, String> = retry_once("test", Duration::from_millis(1), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
