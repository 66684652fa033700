use crate::Result;
use fs4::fs_std::FileExt;
use ohno::IntoAppError;
use std::fs::{File, OpenOptions};
use std::path::Path;

const LOG_TARGET: &str = "   harvest";

/// File name of the lock guarding a work directory
pub const LOCK_FILE_NAME: &str = "harvest.lock";

/// Guard that releases the work directory lock when dropped
#[derive(Debug)]
pub struct WorkLockGuard(File);

impl Drop for WorkLockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.0) {
            log::warn!(target: LOG_TARGET, "Failed to unlock work directory: {e}");
        }
    }
}

/// Take the exclusive advisory lock on `work_dir`, waiting for any other holder.
pub async fn acquire_work_lock(work_dir: &Path) -> Result<WorkLockGuard> {
    let lock_path = work_dir.join(LOCK_FILE_NAME);

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .into_app_err_with(|| format!("opening lock file '{}'", lock_path.display()))?;

    let file = tokio::task::spawn_blocking(move || {
        FileExt::lock_exclusive(&file).into_app_err_with(|| format!("locking '{}'", lock_path.display()))?;
        log::debug!(target: LOG_TARGET, "Acquired work directory lock at '{}'", lock_path.display());
        Ok::<_, ohno::AppError>(file)
    })
    .await
    .into_app_err("lock task panicked")??;

    Ok(WorkLockGuard(file))
}
