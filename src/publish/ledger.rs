use super::json_map::JsonMapFile;
use crate::Result;
use ohno::IntoAppError;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name of the change ledger inside the work directory
pub const SHA_FILE_NAME: &str = "sha256.json";

/// File name of the homepage index, both locally and in the remote store
pub const SDK_LIST_FILE_NAME: &str = "sdk-homepage.json";

/// Remote file name under which the ledger is published at the end of a run
pub const AGGREGATE_FILE_NAME: &str = "sdk-list.json";

/// Hash of the homepage index as last written to the remote store
pub const INDEX_UPLOADED_FILE_NAME: &str = "sdk-homepage.uploaded";

/// Whether `sdk_name` would store its artifact under one of the file names above.
///
/// Compared without regard to ASCII case so the check also holds on case-insensitive file systems.
#[must_use]
pub fn is_reserved_name(sdk_name: &str) -> bool {
    [SHA_FILE_NAME, SDK_LIST_FILE_NAME, AGGREGATE_FILE_NAME]
        .iter()
        .filter_map(|file| file.strip_suffix(".json"))
        .any(|stem| stem.eq_ignore_ascii_case(sdk_name))
}

/// Lowercase hex SHA-256 of `content`
#[must_use]
pub fn content_hash(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Maps each artifact key to the hash of the content most recently written to the remote store.
///
/// Entries are only ever added or overwritten.
#[derive(Debug, Clone)]
pub struct ChangeLedger {
    file: JsonMapFile,
}

impl ChangeLedger {
    pub fn load(work_dir: &Path) -> Result<Self> {
        Ok(Self {
            file: JsonMapFile::load(work_dir.join(SHA_FILE_NAME))?,
        })
    }

    #[must_use]
    pub fn hash_of(&self, key: &str) -> Option<&str> {
        self.file.get(key)
    }

    #[must_use]
    pub fn is_unchanged(&self, key: &str, hash: &str) -> bool {
        self.hash_of(key) == Some(hash)
    }

    /// Record `hash` for `key` and rewrite the ledger file.
    pub fn record(&mut self, key: &str, hash: &str) -> Result<()> {
        if self.file.insert(key, hash) {
            self.file.save()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.file.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file.is_empty()
    }
}

/// Maps each known SDK name to its home page.
///
/// The hash of the last copy written to the remote store is kept next to the index, so an
/// upload that failed is still pending after a restart.
#[derive(Debug, Clone)]
pub struct HomepageIndex {
    file: JsonMapFile,
    uploaded_path: PathBuf,
    uploaded_hash: Option<String>,
}

impl HomepageIndex {
    pub fn load(work_dir: &Path) -> Result<Self> {
        let uploaded_path = work_dir.join(INDEX_UPLOADED_FILE_NAME);
        let uploaded_hash = match fs::read_to_string(&uploaded_path) {
            Ok(hash) => Some(hash.trim().to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e).into_app_err_with(|| format!("reading '{}'", uploaded_path.display())),
        };

        Ok(Self {
            file: JsonMapFile::load(work_dir.join(SDK_LIST_FILE_NAME))?,
            uploaded_path,
            uploaded_hash,
        })
    }

    /// Set the home page of `sdk_name`, saving the file if it changed.
    pub fn update(&mut self, sdk_name: &str, home_page: &str) -> Result<()> {
        if self.file.insert(sdk_name, home_page) {
            self.file.save()?;
        }
        Ok(())
    }

    /// The current index content, if it differs from the last uploaded copy
    pub fn pending_upload(&self) -> Result<Option<Vec<u8>>> {
        if self.file.is_empty() {
            return Ok(None);
        }

        let content = self.file.to_bytes()?;
        if self.uploaded_hash.as_deref() == Some(content_hash(&content).as_str()) {
            return Ok(None);
        }

        Ok(Some(content))
    }

    /// Remember `content` as the copy now held by the remote store.
    pub fn mark_uploaded(&mut self, content: &[u8]) -> Result<()> {
        let hash = content_hash(content);
        fs::write(&self.uploaded_path, &hash).into_app_err_with(|| format!("writing '{}'", self.uploaded_path.display()))?;
        self.uploaded_hash = Some(hash);
        Ok(())
    }

    #[must_use]
    pub fn home_page(&self, sdk_name: &str) -> Option<&str> {
        self.file.get(sdk_name)
    }
}
