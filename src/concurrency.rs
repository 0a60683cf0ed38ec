use futures::future::try_join_all;
use log::debug;
use std::future::Future;
use tokio::sync::Semaphore;

pub const DEFAULT_WORKERS: usize = 5;

/// Runs `f` over `items` with at most `min(workers, items.len())` calls in
/// flight, returning results in input order.
///
/// The first error aborts the batch; pending and in-flight calls are dropped.
pub async fn map_bounded<T, R, E, F, Fut>(items: Vec<T>, workers: usize, f: F) -> Result<Vec<R>, E>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let permits = workers.clamp(1, items.len());
    debug!("Running {} tasks with {} workers", items.len(), permits);

    let semaphore = Semaphore::new(permits);
    let semaphore = &semaphore;
    let f = &f;

    let tasks = items.into_iter().map(|item| async move {
        // never closed, so acquire cannot fail
        let _permit = semaphore.acquire().await.ok();
        f(item).await
    });

    try_join_all(tasks).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
        started: AtomicUsize,
    }

    impl InFlight {
        fn new() -> Self {
            Self {
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                started: AtomicUsize::new(0),
            }
        }

        async fn track<R>(&self, delay_ms: u64, value: R) -> R {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_millis(delay_ms)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            value
        }
    }

    #[tokio::test]
    async fn test_preserves_order_despite_completion_order() {
        let items: Vec<u64> = (0..12).collect();
        let tracker = InFlight::new();
        let results: Result<Vec<u64>, String> = map_bounded(items.clone(), 4, |i| {
            let tracker = &tracker;
            async move { Ok(tracker.track(30 - i * 2, i * 10).await) }
        })
        .await;

        let expected: Vec<u64> = items.iter().map(|i| i * 10).collect();
        assert_eq!(results.unwrap(), expected);
        assert!(tracker.peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_never_exceeds_worker_limit() {
        for (n, workers) in [(1, 5), (3, 5), (10, 1), (10, 3), (20, 5)] {
            let tracker = InFlight::new();
            let results: Result<Vec<usize>, String> = map_bounded((0..n).collect::<Vec<usize>>(), workers, |i| {
                let tracker = &tracker;
                async move { Ok(tracker.track(5, i).await) }
            })
            .await;

            assert_eq!(results.unwrap().len(), n);
            let peak = tracker.peak.load(Ordering::SeqCst);
            assert!(peak <= workers.min(n), "peak {} for n={} workers={}", peak, n, workers);
            assert_eq!(peak, workers.min(n));
        }
    }

    #[tokio::test]
    async fn test_zero_workers_still_runs() {
        let results: Result<Vec<i32>, String> =
            map_bounded(vec![1, 2, 3], 0, |i| async move { Ok(i + 1) }).await;
        assert_eq!(results.unwrap(), vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let results: Result<Vec<i32>, String> =
            map_bounded(Vec::<i32>::new(), 5, |i| async move { Ok(i) }).await;
        assert!(results.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_error_aborts_batch() {
        let tracker = InFlight::new();
        let results: Result<Vec<usize>, String> = map_bounded((0..20).collect::<Vec<usize>>(), 2, |i| {
            let tracker = &tracker;
            async move {
                let i = tracker.track(5, i).await;
                if i == 3 { Err(format!("item {} failed", i)) } else { Ok(i) }
            }
        })
        .await;

        assert_eq!(results.unwrap_err(), "item 3 failed");
        assert!(tracker.started.load(Ordering::SeqCst) < 20);
    }
}
