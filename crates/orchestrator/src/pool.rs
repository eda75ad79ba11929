//! Bounded worker pool over a shared work queue.

use futures_util::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Run every item through `handler` with at most `concurrency` items in
/// flight. Results come back in submission order.
///
/// Workers pull from a shared queue behind a mutex, so a slow item only
/// occupies one worker while the rest keep draining.
pub async fn run_bounded<I, R, F, Fut>(items: Vec<I>, concurrency: usize, handler: F) -> Vec<R>
where
    I: Send + 'static,
    R: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }
    let concurrency = concurrency.max(1).min(total);

    let (work_tx, work_rx) = mpsc::channel::<(usize, I)>(total);
    for (index, item) in items.into_iter().enumerate() {
        // Channel capacity equals queue length; this cannot block.
        let _ = work_tx.send((index, item)).await;
    }
    drop(work_tx);

    let work_rx = Arc::new(Mutex::new(work_rx));
    let handler = Arc::new(handler);
    let (result_tx, mut result_rx) = mpsc::channel::<(usize, R)>(total);

    let workers: Vec<_> = (0..concurrency)
        .map(|worker| {
            let work_rx = Arc::clone(&work_rx);
            let handler = Arc::clone(&handler);
            let result_tx = result_tx.clone();
            tokio::spawn(async move {
                loop {
                    let next = { work_rx.lock().await.recv().await };
                    let Some((index, item)) = next else {
                        break;
                    };
                    let result = handler(item).await;
                    if result_tx.send((index, result)).await.is_err() {
                        break;
                    }
                }
                debug!(worker, "Worker finished");
            })
        })
        .collect();
    drop(result_tx);

    let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
    while let Some((index, result)) = result_rx.recv().await {
        slots[index] = Some(result);
    }
    join_all(workers).await;

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_results_keep_submission_order() {
        let results = run_bounded(vec![3u64, 1, 2], 2, |n| async move {
            // Later items finish first.
            sleep(Duration::from_millis(n * 10)).await;
            n * 100
        })
        .await;

        assert_eq!(results, vec![300, 100, 200]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let in_flight_ref = Arc::clone(&in_flight);
        let peak_ref = Arc::clone(&peak);
        let results = run_bounded(
            (0..10u64).collect::<Vec<_>>(),
            2,
            move |n| {
                let in_flight = Arc::clone(&in_flight_ref);
                let peak = Arc::clone(&peak_ref);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    n
                }
            },
        )
        .await;

        assert_eq!(results.len(), 10);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let results: Vec<u32> = run_bounded(Vec::new(), 4, |n: u32| async move { n }).await;
        assert!(results.is_empty());
    }
}
