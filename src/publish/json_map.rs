//! A string map persisted as a single JSON object file.
//!
//! The file is always read and rewritten whole; there is no partial-update protocol.

use crate::Result;
use ohno::IntoAppError;
use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "   publish";

#[derive(Debug, Clone)]
pub struct JsonMapFile {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonMapFile {
    /// Load the map from `path`.
    ///
    /// A missing file yields an empty map. A file that cannot be parsed is logged and treated as
    /// empty, which only costs a republish of everything it described.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!(target: LOG_TARGET, "No file at '{}', starting empty", path.display());
                return Ok(Self {
                    path,
                    entries: BTreeMap::new(),
                });
            }
            Err(e) => return Err(e).into_app_err_with(|| format!("opening '{}'", path.display())),
        };

        let entries = match serde_json::from_reader(BufReader::new(file)) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Ignoring unreadable '{}': {e:#}", path.display());
                BTreeMap::new()
            }
        };

        Ok(Self { path, entries })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set `key` to `value`, returning `true` if the map changed.
    pub fn insert(&mut self, key: &str, value: &str) -> bool {
        if self.get(key) == Some(value) {
            return false;
        }

        let _ = self.entries.insert(key.to_string(), value.to_string());
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the whole map, keys sorted.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.entries).into_app_err_with(|| format!("serializing '{}'", self.path.display()))
    }

    /// Rewrite the whole file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).into_app_err_with(|| format!("creating directory '{}'", parent.display()))?;
        }

        let file = File::create(&self.path).into_app_err_with(|| format!("creating '{}'", self.path.display()))?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, &self.entries).into_app_err_with(|| format!("writing '{}'", self.path.display()))?;
        writer.flush().into_app_err_with(|| format!("flushing '{}'", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let map = JsonMapFile::load(tmp.path().join("absent.json")).unwrap();
        assert!(map.is_empty());
        assert!(!map.path().exists());
    }

    #[test]
    fn save_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("map.json");

        let mut map = JsonMapFile::load(&path).unwrap();
        assert!(map.insert("zig", "https://ziglang.org"));
        assert!(map.insert("go", "https://go.dev"));
        map.save().unwrap();

        let reloaded = JsonMapFile::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("go"), Some("https://go.dev"));
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.find("\"go\"").unwrap() < text.find("\"zig\"").unwrap());
    }

    #[test]
    fn insert_reports_changes() {
        let tmp = tempfile::tempdir().unwrap();
        let mut map = JsonMapFile::load(tmp.path().join("map.json")).unwrap();

        assert!(map.insert("go", "a"));
        assert!(!map.insert("go", "a"));
        assert!(map.insert("go", "b"));
        assert_eq!(map.get("go"), Some("b"));
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("map.json");
        fs::write(&path, "{ not json").unwrap();

        let map = JsonMapFile::load(&path).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn bytes_match_saved_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("map.json");

        let mut map = JsonMapFile::load(&path).unwrap();
        let _ = map.insert("node", "https://nodejs.org");
        map.save().unwrap();

        assert_eq!(fs::read(&path).unwrap(), map.to_bytes().unwrap());
    }
}
