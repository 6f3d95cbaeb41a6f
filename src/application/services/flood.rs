//! Bounded retry for calls the remote side may rate-limit

use std::future::Future;
use std::time::Duration;

use crate::application::errors::ClientError;

/// Longest flood wait honoured before giving up
pub const DEFAULT_FLOOD_CEILING: Duration = Duration::from_secs(30);

/// Run `op`, retrying exactly once after a flood wait.
///
/// A wait longer than `ceiling` is returned as the error instead of
/// blocking. The retry's result is final, whatever it is.
pub async fn with_flood_retry<T, F, Fut>(ceiling: Duration, mut op: F) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    match op().await {
        Err(ClientError::FloodWait { seconds }) => {
            let wait = Duration::from_secs(seconds);
            if wait > ceiling {
                tracing::warn!("Flood wait of {}s exceeds ceiling of {:?}, giving up", seconds, ceiling);
                return Err(ClientError::FloodWait { seconds });
            }
            tracing::info!("Flood wait: sleeping {}s before retrying", seconds);
            tokio::time::sleep(wait).await;
            op().await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_retries_once_after_flood_wait() {
        let calls = AtomicUsize::new(0);
        let result = with_flood_retry(DEFAULT_FLOOD_CEILING, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ClientError::FloodWait { seconds: 0 })
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_flood_wait_is_final() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_flood_retry(DEFAULT_FLOOD_CEILING, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ClientError::FloodWait { seconds: 0 }) }
        })
        .await;
        assert_eq!(result, Err(ClientError::FloodWait { seconds: 0 }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_wait_above_ceiling_fails_fast() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_flood_retry(Duration::from_secs(10), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ClientError::FloodWait { seconds: 3600 }) }
        })
        .await;
        assert_eq!(result, Err(ClientError::FloodWait { seconds: 3600 }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_other_errors_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_flood_retry(DEFAULT_FLOOD_CEILING, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ClientError::Network("reset".into())) }
        })
        .await;
        assert!(matches!(result, Err(ClientError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
