use super::collector::Collector;
use super::outcome::{Failure, ItemReport, Outcome};
use super::queue::{DEFAULT_QUEUE_CAPACITY, bounded};
use super::registry::Registry;
use super::summary::RunSummary;
use super::worker_pool::run_workers;
use crate::publish::{Artifact, PublishOptions, Publisher};
use core::time::Duration;
use std::sync::Arc;
use tokio::task::JoinError;

const LOG_TARGET: &str = "   harvest";

/// Default pause between two collectors in the sequential modes
pub const DEFAULT_SEQUENTIAL_DELAY: Duration = Duration::from_secs(6);

/// How a run walks the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Every collector of the general list, one at a time, pausing between them.
    Sequential,

    /// Every collector of the general list through the bounded queue and a worker pool.
    Concurrent { workers: usize },

    /// The one collector with this name.
    Single(String),

    /// Every collector of one source family, one at a time, pausing between them.
    Family(String),
}

#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub queue_capacity: usize,
    pub sequential_delay: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            sequential_delay: DEFAULT_SEQUENTIAL_DELAY,
        }
    }
}

/// Drives one run of the registry and the final aggregate publish.
#[derive(Debug)]
pub struct Orchestrator {
    registry: Registry,
    publisher: Arc<Publisher>,
    settings: RunSettings,
}

impl Orchestrator {
    #[must_use]
    pub const fn new(registry: Registry, publisher: Arc<Publisher>, settings: RunSettings) -> Self {
        Self {
            registry,
            publisher,
            settings,
        }
    }

    /// Run `mode` to completion, then publish the ledger as the aggregate list.
    ///
    /// Individual failures never abort the run; they are recorded in the returned summary.
    pub async fn run(self, mode: &RunMode) -> RunSummary {
        let Self {
            registry,
            publisher,
            settings,
        } = self;

        let mut summary = RunSummary::default();

        match mode {
            RunMode::Sequential => {
                run_sequential(registry.into_general(), &publisher, settings.sequential_delay, &mut summary).await;
            }

            RunMode::Concurrent { workers } => {
                let (dispatcher, queue) = bounded(settings.queue_capacity);
                let producer = tokio::spawn(dispatcher.dispatch_all(registry.into_general()));

                let handler_publisher = Arc::clone(&publisher);
                let pool = run_workers(queue, *workers, move |collector| {
                    let publisher = Arc::clone(&handler_publisher);
                    async move { run_collector(Some(collector), &publisher).await }
                })
                .await;

                if let Err(e) = producer.await {
                    log::error!(target: LOG_TARGET, "Dispatcher stopped unexpectedly: {e}");
                }

                for report in pool.outputs.into_iter().flatten() {
                    summary.push(report);
                }
                summary.lost_workers = pool.lost_workers;
            }

            RunMode::Single(name) => {
                let collector = registry.take_named(name);
                if collector.is_none() {
                    log::warn!(target: LOG_TARGET, "No collector named '{name}' is registered");
                }

                if let Some(report) = run_collector(collector, &publisher).await {
                    summary.push(report);
                }
            }

            RunMode::Family(family) => match registry.into_family(family) {
                Some(members) => {
                    run_sequential(members, &publisher, settings.sequential_delay, &mut summary).await;
                }
                None => log::warn!(target: LOG_TARGET, "No source family named '{family}' is registered"),
            },
        }

        if let Err(e) = publisher.publish_ledger().await {
            log::error!(target: LOG_TARGET, "Could not publish the aggregate list: {e}");
            summary.aggregate_failure = Some(e.into());
        }

        summary
    }
}

async fn run_sequential(collectors: Vec<Box<dyn Collector>>, publisher: &Publisher, delay: Duration, summary: &mut RunSummary) {
    let total = collectors.len();

    for (index, collector) in collectors.into_iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        log::debug!(target: LOG_TARGET, "Collector {} of {total}", index + 1);
        if let Some(report) = run_collector(Some(collector), publisher).await {
            summary.push(report);
        }
    }
}

/// Run one collector and publish its artifact.
///
/// An absent collector is a no-op. The collector runs as its own task so that a panic inside
/// it is contained and reported like any other failure.
pub async fn run_collector(collector: Option<Box<dyn Collector>>, publisher: &Publisher) -> Option<ItemReport> {
    let mut collector = collector?;
    let name = collector.name().to_string();

    log::info!(target: LOG_TARGET, "Collecting '{name}'");

    let task = tokio::spawn(async move {
        let result = collector.start().await;
        (collector, result)
    });

    let collector = match task.await {
        Ok((collector, Ok(()))) => collector,
        Ok((_, Err(e))) => {
            log::error!(target: LOG_TARGET, "Collecting '{name}' failed: {e:#}");
            return Some(ItemReport::failed(name, Failure::Collect(e)));
        }
        Err(e) => {
            let message = panic_message(e);
            log::error!(target: LOG_TARGET, "Collector '{name}' panicked: {message}");
            return Some(ItemReport::failed(name, Failure::Panicked(message)));
        }
    };

    let artifact = Artifact {
        sdk_name: name,
        home_page: collector.home_page().to_string(),
        versions: collector.versions().to_vec(),
    };

    let options = PublishOptions {
        record_hash: collector.track_changes(),
    };

    let outcome = match publisher.publish(&artifact, options).await {
        Ok(status) => Outcome::from(status),
        Err(e) => {
            log::error!(target: LOG_TARGET, "Publishing '{}' failed: {e}", artifact.sdk_name);
            Outcome::Failed(e.into())
        }
    };

    Some(ItemReport::new(artifact.sdk_name, outcome))
}

fn panic_message(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }

    let payload = e.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
