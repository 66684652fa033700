use super::artifact::Artifact;
use super::ledger::{AGGREGATE_FILE_NAME, ChangeLedger, HomepageIndex, SDK_LIST_FILE_NAME, content_hash};
use crate::Result;
use crate::store::{Client, StoreError};
use core::fmt;
use ohno::IntoAppError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

const LOG_TARGET: &str = "   publish";

/// Per-call publish settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOptions {
    /// Consult and update the change ledger. When `false`, the content is always written and
    /// its hash is not recorded.
    pub record_hash: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self { record_hash: true }
    }
}

/// What a successful publish call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStatus {
    /// New content was written to the remote store.
    Published,

    /// The content hash matched the ledger; nothing was written.
    Unchanged,

    /// The artifact carried no versions; nothing was written.
    Empty,
}

/// Error type for publish operations
#[derive(Debug)]
pub enum PublishError {
    /// The remote write still hit a stale version token after one retry.
    Conflict { path: String },

    /// The remote store rejected or failed the write for another reason.
    Store(ohno::AppError),

    /// The local copy, ledger, or index could not be written.
    Local(ohno::AppError),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { path } => write!(f, "concurrent update of '{path}' in the remote store"),
            Self::Store(e) => write!(f, "remote write failed: {e:#}"),
            Self::Local(e) => write!(f, "local write failed: {e:#}"),
        }
    }
}

impl core::error::Error for PublishError {}

impl From<StoreError> for PublishError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { path, .. } => Self::Conflict { path },
            StoreError::Other(e) => Self::Store(e),
        }
    }
}

/// Decides whether collected content changed and writes it locally and remotely.
///
/// One publisher is shared by all workers of a run. The ledger and index are guarded by
/// short-lived locks that are never held across a remote call.
#[derive(Debug)]
pub struct Publisher {
    store: Arc<Client>,
    repo: String,
    remote_dir: String,
    work_dir: PathBuf,
    ledger: Mutex<ChangeLedger>,
    index: Mutex<HomepageIndex>,
}

impl Publisher {
    /// Create a publisher writing to `repo` under `remote_dir`, keeping local state in `work_dir`.
    pub fn new(store: Arc<Client>, repo: impl Into<String>, remote_dir: impl Into<String>, work_dir: impl Into<PathBuf>) -> Result<Self> {
        let work_dir = work_dir.into();
        fs::create_dir_all(&work_dir).into_app_err_with(|| format!("creating work directory '{}'", work_dir.display()))?;

        Ok(Self {
            store,
            repo: repo.into(),
            remote_dir: remote_dir.into(),
            ledger: Mutex::new(ChangeLedger::load(&work_dir)?),
            index: Mutex::new(HomepageIndex::load(&work_dir)?),
            work_dir,
        })
    }

    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Hash currently recorded for `sdk_name`, if any
    #[must_use]
    pub fn recorded_hash(&self, sdk_name: &str) -> Option<String> {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .hash_of(sdk_name)
            .map(str::to_string)
    }

    /// Publish one artifact.
    ///
    /// Skips everything when the artifact is empty or, with hash recording enabled, when its
    /// content hash matches the ledger. Otherwise writes the local copy, the remote copy, and
    /// the homepage index if it changed, then records the new hash.
    pub async fn publish(&self, artifact: &Artifact, options: PublishOptions) -> Result<PublishStatus, PublishError> {
        if artifact.versions.is_empty() {
            log::info!(target: LOG_TARGET, "No versions collected for '{}', nothing to publish", artifact.sdk_name);
            return Ok(PublishStatus::Empty);
        }

        let content = artifact.serialized().map_err(PublishError::Local)?;
        let hash = content_hash(&content);

        if options.record_hash && self.ledger.lock().unwrap_or_else(PoisonError::into_inner).is_unchanged(&artifact.sdk_name, &hash) {
            log::debug!(target: LOG_TARGET, "Content of '{}' is unchanged, skipping upload", artifact.sdk_name);
            return Ok(PublishStatus::Unchanged);
        }

        let file_name = artifact.file_name();
        let local_path = self.work_dir.join(&file_name);
        fs::write(&local_path, &content)
            .into_app_err_with(|| format!("writing '{}'", local_path.display()))
            .map_err(PublishError::Local)?;

        self.index
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update(&artifact.sdk_name, &artifact.home_page)
            .map_err(PublishError::Local)?;

        self.write_remote(&file_name, &content).await?;

        if options.record_hash {
            self.ledger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record(&artifact.sdk_name, &hash)
                .map_err(PublishError::Local)?;
        }

        self.upload_index_if_needed().await?;

        log::info!(
            target: LOG_TARGET,
            "Published {} version(s) of '{}'",
            artifact.versions.len(),
            artifact.sdk_name
        );

        Ok(PublishStatus::Published)
    }

    /// Write the ledger file to the remote store as the aggregate SDK list.
    ///
    /// A homepage index left pending by an earlier failure, in this process or a previous one,
    /// is uploaded first. Returns `false` if there is no ledger content to publish.
    pub async fn publish_ledger(&self) -> Result<bool, PublishError> {
        let index = self.upload_index_if_needed().await;
        let aggregate = self.write_aggregate().await;
        index?;
        aggregate
    }

    async fn write_aggregate(&self) -> Result<bool, PublishError> {
        let path = self.ledger.lock().unwrap_or_else(PoisonError::into_inner).path().to_path_buf();

        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(e)
                    .into_app_err_with(|| format!("reading '{}'", path.display()))
                    .map_err(PublishError::Local);
            }
        };

        if content.is_empty() {
            return Ok(false);
        }

        self.write_remote(AGGREGATE_FILE_NAME, &content).await?;
        log::info!(target: LOG_TARGET, "Published aggregate list '{AGGREGATE_FILE_NAME}'");
        Ok(true)
    }

    async fn upload_index_if_needed(&self) -> Result<(), PublishError> {
        let snapshot = self.index.lock().unwrap_or_else(PoisonError::into_inner).pending_upload().map_err(PublishError::Local)?;
        let Some(snapshot) = snapshot else {
            return Ok(());
        };

        self.write_remote(SDK_LIST_FILE_NAME, &snapshot).await?;

        self.index
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .mark_uploaded(&snapshot)
            .map_err(PublishError::Local)
    }

    /// Write through the store, retrying once with a fresh token if the first token went stale.
    async fn write_remote(&self, file_name: &str, content: &[u8]) -> Result<(), PublishError> {
        match self.store.write_file(&self.repo, &self.remote_dir, file_name, content).await {
            Ok(_) => Ok(()),
            Err(StoreError::Conflict { path, status }) => {
                log::warn!(target: LOG_TARGET, "Version token for '{path}' went stale (HTTP {status}), retrying once");
                let _ = self.store.write_file(&self.repo, &self.remote_dir, file_name, content).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
