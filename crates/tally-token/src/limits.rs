//! Deadlines and token budgets.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{TokenError, TokenResult};

/// Run `fut` under a deadline.
///
/// On expiry the token is cancelled so detached work winds down, and
/// `DeadlineExceeded` is returned.
pub async fn with_deadline<T, Fut>(
    cancel: &CancellationToken,
    timeout: Duration,
    fut: Fut,
) -> TokenResult<T>
where
    Fut: Future<Output = TokenResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(?timeout, "token analysis deadline exceeded");
            cancel.cancel();
            Err(TokenError::DeadlineExceeded(timeout))
        }
    }
}

/// Fail when `count` is over an optional budget.
pub fn check_limit(count: usize, limit: Option<usize>) -> TokenResult<()> {
    match limit {
        Some(limit) if count > limit => Err(TokenError::LimitExceeded { count, limit }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let cancel = CancellationToken::new();
        let value = with_deadline(&cancel, Duration::from_secs(5), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_deadline_cancels_token() {
        let cancel = CancellationToken::new();
        let err = with_deadline(&cancel, Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, TokenError::DeadlineExceeded(d) if d == Duration::from_millis(50)));
        assert!(cancel.is_cancelled());
        assert_eq!(err.to_string(), "deadline exceeded after 50ms");
    }

    #[test]
    fn test_check_limit() {
        assert!(check_limit(100, None).is_ok());
        assert!(check_limit(100, Some(100)).is_ok());
        let err = check_limit(101, Some(100)).unwrap_err();
        assert_eq!(err.to_string(), "token count 101 exceeds limit 100");
    }
}
