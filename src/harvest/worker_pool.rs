use super::queue::WorkQueue;
use futures_util::future::join_all;
use std::sync::Arc;

const LOG_TARGET: &str = "   workers";

/// What a pool run produced
#[derive(Debug)]
pub struct PoolOutput<T> {
    /// Outputs in completion order per worker, with no ordering across workers
    pub outputs: Vec<T>,

    /// Workers that stopped abnormally; everything they had produced is missing from `outputs`
    pub lost_workers: usize,
}

/// Drain `queue` with `workers` concurrent tasks, each handling one item at a time.
///
/// Returns once every worker has seen the queue closed and drained, or has stopped.
pub async fn run_workers<T, F, Fut>(queue: WorkQueue<T>, workers: usize, handler: F) -> PoolOutput<Fut::Output>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    let workers = workers.max(1);
    let handler = Arc::new(handler);

    log::debug!(target: LOG_TARGET, "Starting {workers} worker(s)");

    let tasks: Vec<_> = (0..workers)
        .map(|id| {
            let queue = queue.clone();
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let mut outputs = Vec::new();
                while let Some(item) = queue.next().await {
                    outputs.push((*handler)(item).await);
                }
                log::debug!(target: LOG_TARGET, "Worker {id} finished after {} item(s)", outputs.len());
                outputs
            })
        })
        .collect();

    drop(queue);

    let mut outputs = Vec::new();
    let mut lost_workers = 0;
    for joined in join_all(tasks).await {
        match joined {
            Ok(worker_outputs) => outputs.extend(worker_outputs),
            Err(e) => {
                log::error!(target: LOG_TARGET, "A worker stopped unexpectedly, its results are lost: {e}");
                lost_workers += 1;
            }
        }
    }

    PoolOutput { outputs, lost_workers }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::harvest::queue::bounded;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use core::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_item_is_processed_exactly_once() {
        for workers in 1..=4 {
            for total in [0_usize, 1, 7, 25] {
                let (dispatcher, queue) = bounded(3);
                let producer = tokio::spawn(dispatcher.dispatch_all(0..total));

                let mut seen = run_workers(queue, workers, |item| async move {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    item
                })
                .await
                .outputs;

                assert_eq!(producer.await.unwrap(), total);
                seen.sort_unstable();
                assert_eq!(seen, (0..total).collect::<Vec<_>>(), "workers={workers} total={total}");
            }
        }
    }

    #[tokio::test]
    async fn barrier_waits_for_all_items() {
        let done = Arc::new(AtomicUsize::new(0));
        let (dispatcher, queue) = bounded(2);
        let producer = tokio::spawn(dispatcher.dispatch_all(0..10));

        let counter = Arc::clone(&done);
        let _ = run_workers(queue, 3, move |_: i32| {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                let _ = counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(done.load(Ordering::SeqCst), 10);
        let _ = producer.await.unwrap();
    }

    #[tokio::test]
    async fn zero_workers_still_drains() {
        let (dispatcher, queue) = bounded(5);
        let _ = dispatcher.dispatch_all(["x", "y"]).await;

        let seen = run_workers(queue, 0, |item| async move { item }).await.outputs;
        assert_eq!(seen, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn single_worker_keeps_order() {
        let (dispatcher, queue) = bounded(4);
        let producer = tokio::spawn(dispatcher.dispatch_all(0..12));

        let seen = run_workers(queue, 1, |item| async move { item }).await.outputs;
        assert_eq!(seen, (0..12).collect::<Vec<_>>());
        let _ = producer.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stopped_worker_is_counted() {
        let (dispatcher, queue) = bounded(2);
        let producer = tokio::spawn(dispatcher.dispatch_all(0..8));

        let pool = run_workers(queue, 2, |item: i32| async move {
            assert_ne!(item, 3, "handler failure");
            item
        })
        .await;

        assert_eq!(pool.lost_workers, 1);
        assert!(!pool.outputs.contains(&3));
        assert!(pool.outputs.contains(&7));
        let _ = producer.await.unwrap();
    }
}
