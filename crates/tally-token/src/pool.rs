//! Bounded parallel map-reduce.
//!
//! One producer feeds a bounded work queue, a fixed set of workers pulls
//! from it, and the caller's task drains results as the single writer of the
//! accumulator. The first failure cancels the pool's token; every blocking
//! point (enqueue, dequeue, result push) races against that token, and the
//! failure is returned without any partial result.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{TokenError, TokenResult};

/// Default worker count per pool.
pub const DEFAULT_WORKERS: usize = 10;

/// Run `work` over `items` with at most `workers` in flight and fold the
/// results into `init`.
///
/// `work` receives a token that is cancelled when the caller cancels or any
/// sibling fails; nested pools should be started from it.
pub async fn bounded_fold<T, R, A, F, Fut>(
    items: Vec<T>,
    workers: usize,
    cancel: &CancellationToken,
    work: F,
    init: A,
    mut fold: impl FnMut(&mut A, R),
) -> TokenResult<A>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TokenResult<R>> + Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(TokenError::Cancelled);
    }
    if items.is_empty() {
        return Ok(init);
    }

    let workers = workers.clamp(1, items.len());
    let token = cancel.child_token();
    let work = Arc::new(work);
    debug!(items = items.len(), workers, "starting worker pool");

    let (item_tx, item_rx) = mpsc::channel::<T>(workers);
    let item_rx = Arc::new(Mutex::new(item_rx));
    let (result_tx, mut result_rx) = mpsc::channel::<TokenResult<R>>(workers);

    let mut tasks = JoinSet::new();

    let producer_token = token.clone();
    tasks.spawn(async move {
        for item in items {
            tokio::select! {
                biased;
                _ = producer_token.cancelled() => break,
                sent = item_tx.send(item) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
    });

    for _ in 0..workers {
        let token = token.clone();
        let queue = Arc::clone(&item_rx);
        let results = result_tx.clone();
        let work = Arc::clone(&work);

        tasks.spawn(async move {
            loop {
                let next = tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    item = async { queue.lock().await.recv().await } => item,
                };
                let Some(item) = next else { break };

                let outcome = work(item, token.clone()).await;
                let failed = outcome.is_err();

                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    sent = results.send(outcome) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }

                if failed {
                    break;
                }
            }
        });
    }

    // Only workers hold the queue and result senders from here on.
    drop(item_rx);
    drop(result_tx);

    let mut acc = init;
    let mut first_error = None;
    while let Some(outcome) = result_rx.recv().await {
        match outcome {
            Ok(result) => fold(&mut acc, result),
            Err(err) => {
                if !err.is_cancellation() {
                    warn!(error = %err, "worker failed, cancelling pool");
                }
                token.cancel();
                first_error = Some(err);
                break;
            }
        }
    }
    drop(result_rx);

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            if first_error.is_none() {
                token.cancel();
                first_error = Some(TokenError::Worker(e.to_string()));
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }
    if cancel.is_cancelled() {
        return Err(TokenError::Cancelled);
    }
    Ok(acc)
}

/// [`bounded_fold`] collecting results in completion order.
pub async fn bounded_map<T, R, F, Fut>(
    items: Vec<T>,
    workers: usize,
    cancel: &CancellationToken,
    work: F,
) -> TokenResult<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TokenResult<R>> + Send + 'static,
{
    let capacity = items.len();
    bounded_fold(
        items,
        workers,
        cancel,
        work,
        Vec::with_capacity(capacity),
        |acc, r| acc.push(r),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_empty_input() {
        let out: Vec<usize> = bounded_map(Vec::<usize>::new(), 4, &CancellationToken::new(), |i, _| async move {
            Ok(i)
        })
        .await
        .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fold_sums_every_item() {
        let items: Vec<usize> = (1..=500).collect();
        let total = bounded_fold(
            items,
            DEFAULT_WORKERS,
            &CancellationToken::new(),
            |i, _| async move {
                tokio::task::yield_now().await;
                Ok(i * 2)
            },
            0usize,
            |acc, r| *acc += r,
        )
        .await
        .unwrap();
        assert_eq!(total, 500 * 501);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (flight, high) = (Arc::clone(&in_flight), Arc::clone(&peak));
        let out = bounded_map((0..40).collect::<Vec<_>>(), 3, &CancellationToken::new(), move |i, _| {
            let (flight, high) = (Arc::clone(&flight), Arc::clone(&high));
            async move {
                let now = flight.fetch_add(1, Ordering::SeqCst) + 1;
                high.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                flight.fetch_sub(1, Ordering::SeqCst);
                Ok(i)
            }
        })
        .await
        .unwrap();

        assert_eq!(out.len(), 40);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_first_error_stops_remaining_work() {
        let started = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&started);

        let err = bounded_map((0..1_000).collect::<Vec<usize>>(), 2, &CancellationToken::new(), move |i, _| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if i == 3 {
                    return Err(TokenError::Backend(format!("item {}", i)));
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
                Ok(i)
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "failed to encode text: item 3");
        assert!(started.load(Ordering::SeqCst) < 1_000);
    }

    #[tokio::test]
    async fn test_failure_cancels_sibling_tokens() {
        let err = bounded_map(vec![0usize, 1], 2, &CancellationToken::new(), |i, token| async move {
            if i == 0 {
                return Err::<usize, _>(TokenError::Backend("first".into()));
            }
            // Only finishes once the failing sibling cancelled the pool.
            token.cancelled().await;
            Err(TokenError::Cancelled)
        })
        .await
        .unwrap_err();
        assert!(matches!(err, TokenError::Backend(_)));
    }

    #[tokio::test]
    async fn test_caller_cancellation() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let err = bounded_map((0..100).collect::<Vec<usize>>(), 4, &cancel, move |i, token| {
            let trigger = trigger.clone();
            async move {
                if i == 10 {
                    trigger.cancel();
                }
                tokio::select! {
                    _ = token.cancelled() => Err(TokenError::Cancelled),
                    _ = tokio::time::sleep(Duration::from_millis(1)) => Ok(i),
                }
            }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, TokenError::Cancelled));
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = bounded_map(vec![1usize], 1, &cancel, |i, _| async move { Ok(i) })
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Cancelled));
    }

    #[tokio::test]
    async fn test_worker_panic_is_reported() {
        let err = bounded_map(vec![1usize, 2, 3], 3, &CancellationToken::new(), |i, _| async move {
            if i == 2 {
                panic!("worker blew up");
            }
            Ok(i)
        })
        .await
        .unwrap_err();
        assert!(matches!(err, TokenError::Worker(_)));
    }
}
