use crate::Result;
use crate::publish::VersionRecord;
use futures::future::BoxFuture;

/// A pluggable source of version records for one SDK.
///
/// A collector is built once when the registry is assembled, started exactly once by a worker,
/// and dropped after its artifact has been published.
pub trait Collector: Send {
    /// Stable name, unique across the registry. Also the artifact key and file stem.
    fn name(&self) -> &str;

    /// Reference URL for the SDK
    fn home_page(&self) -> &str;

    /// Perform the collection, filling the collector's version list.
    fn start(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Versions discovered by [`Collector::start`]
    fn versions(&self) -> &[VersionRecord];

    /// Whether the publisher should consult and update the change ledger for this collector.
    fn track_changes(&self) -> bool {
        true
    }
}
