use crate::Result;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};

/// One downloadable build of one SDK version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_type: Option<String>,
    #[serde(default, skip_serializing_if = "core::ops::Not::not")]
    pub prerelease: bool,
}

impl VersionRecord {
    #[must_use]
    pub fn new(version: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            url: url.into(),
            os: None,
            arch: None,
            size: None,
            checksum: None,
            checksum_type: None,
            prerelease: false,
        }
    }
}

/// What a collector hands to the publisher once it has run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub sdk_name: String,
    pub home_page: String,
    pub versions: Vec<VersionRecord>,
}

impl Artifact {
    /// The bytes that are hashed, stored locally, and written remotely.
    pub fn serialized(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.versions).into_app_err_with(|| format!("serializing versions of '{}'", self.sdk_name))
    }

    /// File name of this artifact, locally and in the remote store
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.json", self.sdk_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_skips_empty_fields() {
        let mut record = VersionRecord::new("1.22.0", "https://go.dev/dl/go1.22.0.linux-amd64.tar.gz");
        record.os = Some("linux".to_string());
        record.arch = Some("amd64".to_string());

        let artifact = Artifact {
            sdk_name: "go".to_string(),
            home_page: "https://go.dev".to_string(),
            versions: vec![record],
        };

        let text = String::from_utf8(artifact.serialized().unwrap()).unwrap();
        assert!(text.contains("\"version\": \"1.22.0\""));
        assert!(text.contains("\"os\": \"linux\""));
        assert!(!text.contains("checksum"));
        assert!(!text.contains("prerelease"));
        assert_eq!(artifact.file_name(), "go.json");
    }

    #[test]
    fn test_serialized_is_stable() {
        let artifact = Artifact {
            sdk_name: "zig".to_string(),
            home_page: "https://ziglang.org".to_string(),
            versions: vec![VersionRecord::new("0.13.0", "https://ziglang.org/zig-0.13.0.tar.xz")],
        };

        assert_eq!(artifact.serialized().unwrap(), artifact.clone().serialized().unwrap());
    }

    #[test]
    fn test_record_round_trips_prerelease() {
        let mut record = VersionRecord::new("2.0.0-rc1", "https://example.com/a.zip");
        record.prerelease = true;

        let json = serde_json::to_string(&record).unwrap();
        let back: VersionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
