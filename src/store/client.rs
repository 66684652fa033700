//! GitHub contents and releases client
//!
//! The contents API is used as a blob store keyed by `(repository, path)`. Every write must
//! carry the blob `sha` currently stored at the path; GitHub rejects the write when that token
//! is stale, which gives us optimistic concurrency between independent writers.

use super::releases::{PaginationEnd, ReleaseItem, ReleaseListing};
use crate::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use core::fmt;
use core::time::Duration;
use ohno::IntoAppError;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "     store";

/// Default base URL for the GitHub REST API
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const RELEASES_TIMEOUT: Duration = Duration::from_secs(180);

/// Number of releases requested per page
pub const RELEASES_PAGE_SIZE: usize = 100;

/// Hard ceiling on the number of release pages fetched for one repository
pub const MAX_RELEASE_PAGES: u32 = 10;

/// Error type for remote store operations
#[derive(Debug)]
pub enum StoreError {
    /// The write was rejected because the version token no longer matches the stored file.
    Conflict { path: String, status: u16 },

    /// Any other transport, status, or decoding failure.
    Other(ohno::AppError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { path, status } => {
                write!(f, "version token for '{path}' is stale (HTTP {status})")
            }
            Self::Other(e) => write!(f, "{e:#}"),
        }
    }
}

impl core::error::Error for StoreError {}

impl From<ohno::AppError> for StoreError {
    fn from(e: ohno::AppError) -> Self {
        Self::Other(e)
    }
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    sha: String,
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    content: Option<ContentEntry>,
}

/// What the store reported after a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub path: String,
    /// The new version token, if the store returned one.
    pub sha: Option<String>,
}

/// Remote store client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a new client with optional authentication token and proxy
    pub fn new(token: Option<&str>, base_url: impl Into<String>, proxy: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("token {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let mut client_builder = reqwest::Client::builder().user_agent("sdk-harvest").default_headers(headers);

        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy).into_app_err_with(|| format!("invalid proxy URL '{proxy}'"))?;
            client_builder = client_builder.proxy(proxy);
        }

        let base_url: String = base_url.into();

        Ok(Self {
            client: client_builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn contents_url(&self, repo: &str, path: &str) -> String {
        format!("{}/repos/{repo}/contents/{path}", self.base_url)
    }

    /// Read the current version token of a file, or `None` if the path does not exist.
    ///
    /// The token must be fetched right before every write; it changes with every successful
    /// write by any writer.
    pub async fn version_token(&self, repo: &str, path: &str) -> Result<Option<String>, StoreError> {
        let url = self.contents_url(repo, path);
        let resp = self
            .client
            .get(&url)
            .timeout(TOKEN_TIMEOUT)
            .send()
            .await
            .into_app_err_with(|| format!("looking up version token for '{path}' in '{repo}'"))?;

        if resp.status() == StatusCode::NOT_FOUND {
            log::debug!(target: LOG_TARGET, "No file at '{path}' in '{repo}' yet");
            return Ok(None);
        }

        let entry: ContentEntry = resp
            .error_for_status()
            .into_app_err_with(|| format!("looking up version token for '{path}' in '{repo}'"))?
            .json()
            .await
            .into_app_err_with(|| format!("decoding contents entry for '{path}' in '{repo}'"))?;

        Ok(Some(entry.sha))
    }

    /// Write `content` to `<remote_dir>/<file_name>`, fetching a fresh version token first.
    ///
    /// A stale token surfaces as [`StoreError::Conflict`]; the write is not retried here.
    pub async fn write_file(&self, repo: &str, remote_dir: &str, file_name: &str, content: &[u8]) -> Result<WriteReceipt, StoreError> {
        let path = remote_path(remote_dir, file_name);
        let token = self.version_token(repo, &path).await?;
        self.put_contents(repo, &path, content, token.as_deref()).await
    }

    /// Issue a single conditional write of `content` to `path` guarded by `token`.
    ///
    /// Pass `None` when creating a file that does not exist yet.
    pub async fn put_contents(&self, repo: &str, path: &str, content: &[u8], token: Option<&str>) -> Result<WriteReceipt, StoreError> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let body = WriteRequest {
            message: format!("update file: {file_name}."),
            content: STANDARD.encode(content),
            sha: token.filter(|t| !t.is_empty()),
        };

        let url = self.contents_url(repo, path);
        let resp = self
            .client
            .put(&url)
            .timeout(WRITE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .into_app_err_with(|| format!("writing '{path}' to '{repo}'"))?;

        let status = resp.status();

        // 409: the sha does not match; 422 without a sha: a file appeared after we saw none
        let created = body.sha.is_none();
        if status == StatusCode::CONFLICT || (status == StatusCode::UNPROCESSABLE_ENTITY && created) {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let written: WriteResponse = resp
            .error_for_status()
            .into_app_err_with(|| format!("writing '{path}' to '{repo}'"))?
            .json()
            .await
            .into_app_err_with(|| format!("decoding write response for '{path}'"))?;

        log::debug!(target: LOG_TARGET, "Wrote {} bytes to '{path}' in '{repo}'", content.len());

        Ok(WriteReceipt {
            path: path.to_string(),
            sha: written.content.map(|c| c.sha),
        })
    }

    /// List the releases of `repo`, newest first, up to [`MAX_RELEASE_PAGES`] pages.
    pub async fn list_releases(&self, repo: &str) -> Result<ReleaseListing> {
        let mut items = Vec::new();

        for page in 1..=MAX_RELEASE_PAGES {
            let page_items = self.release_page(repo, page).await?;
            if page_items.is_empty() {
                log::debug!(target: LOG_TARGET, "Listed {} release(s) of '{repo}' in {page} page(s)", items.len());
                return Ok(ReleaseListing {
                    items,
                    pages: page,
                    end: PaginationEnd::Exhausted,
                });
            }

            items.extend(page_items);
        }

        log::warn!(
            target: LOG_TARGET,
            "Release listing of '{repo}' stopped at the {MAX_RELEASE_PAGES}-page ceiling; older releases were not fetched"
        );

        Ok(ReleaseListing {
            items,
            pages: MAX_RELEASE_PAGES,
            end: PaginationEnd::CeilingReached,
        })
    }

    async fn release_page(&self, repo: &str, page: u32) -> Result<Vec<ReleaseItem>> {
        let url = format!("{}/repos/{repo}/releases?per_page={RELEASES_PAGE_SIZE}&page={page}", self.base_url);

        self.client
            .get(&url)
            .timeout(RELEASES_TIMEOUT)
            .send()
            .await
            .into_app_err_with(|| format!("fetching releases page {page} of '{repo}'"))?
            .error_for_status()
            .into_app_err_with(|| format!("fetching releases page {page} of '{repo}'"))?
            .json()
            .await
            .into_app_err_with(|| format!("decoding releases page {page} of '{repo}'"))
    }
}

/// Join a remote directory and a file name into a repository-relative path
#[must_use]
pub fn remote_path(remote_dir: &str, file_name: &str) -> String {
    let dir = remote_dir.trim_matches('/');
    if dir.is_empty() {
        file_name.trim_start_matches('/').to_string()
    } else {
        format!("{dir}/{}", file_name.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REPO: &str = "owner/store";

    fn release_page_json(count: usize, offset: usize) -> serde_json::Value {
        let items: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "tag_name": format!("v0.{}.0", offset + i),
                    "prerelease": false,
                    "assets": []
                })
            })
            .collect();
        serde_json::Value::Array(items)
    }

    #[test]
    fn test_remote_path() {
        assert_eq!(remote_path("", "go.json"), "go.json");
        assert_eq!(remote_path("/", "go.json"), "go.json");
        assert_eq!(remote_path("sdks", "go.json"), "sdks/go.json");
        assert_eq!(remote_path("/sdks/", "go.json"), "sdks/go.json");
        assert_eq!(remote_path("a/b", "/go.json"), "a/b/go.json");
    }

    #[test]
    fn test_client_base_url_trailing_slash() {
        let client = Client::new(None, "https://api.github.com/", None).unwrap();
        assert_eq!(client.base_url(), "https://api.github.com");
    }

    #[test]
    fn test_client_rejects_bad_proxy() {
        let _ = Client::new(None, DEFAULT_API_BASE_URL, Some("http://[::1")).unwrap_err();
    }

    #[test]
    fn test_store_error_display() {
        let conflict = StoreError::Conflict {
            path: "sdks/go.json".to_string(),
            status: 409,
        };
        assert_eq!(conflict.to_string(), "version token for 'sdks/go.json' is stale (HTTP 409)");
    }

    #[tokio::test]
    async fn test_version_token_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/owner/store/contents/sdks/go.json"))
            .and(header("accept", ACCEPT_HEADER))
            .and(header("authorization", "token secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": "abc123", "path": "sdks/go.json" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(Some("secret"), server.uri(), None).unwrap();
        let token = client.version_token(REPO, "sdks/go.json").await.unwrap();
        assert_eq!(token.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_version_token_missing_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/owner/store/contents/go.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = Client::new(None, server.uri(), None).unwrap();
        assert!(client.version_token(REPO, "go.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_version_token_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/owner/store/contents/go.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = Client::new(None, server.uri(), None).unwrap();
        let err = client.version_token(REPO, "go.json").await.unwrap_err();
        assert!(matches!(err, StoreError::Other(_)));
    }

    #[tokio::test]
    async fn test_write_file_with_fresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/owner/store/contents/sdks/go.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": "old-sha" })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/repos/owner/store/contents/sdks/go.json"))
            .and(body_partial_json(json!({
                "message": "update file: go.json.",
                "content": STANDARD.encode(b"[1,2,3]"),
                "sha": "old-sha"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": { "sha": "new-sha" } })))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(Some("secret"), server.uri(), None).unwrap();
        let receipt = client.write_file(REPO, "sdks", "go.json", b"[1,2,3]").await.unwrap();
        assert_eq!(receipt.path, "sdks/go.json");
        assert_eq!(receipt.sha.as_deref(), Some("new-sha"));
    }

    #[tokio::test]
    async fn test_write_file_creates_new_file_without_sha() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/owner/store/contents/new.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/repos/owner/store/contents/new.json"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "content": { "sha": "first" } })))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(None, server.uri(), None).unwrap();
        let receipt = client.write_file(REPO, "", "new.json", b"{}").await.unwrap();
        assert_eq!(receipt.sha.as_deref(), Some("first"));

        let requests = server.received_requests().await.unwrap();
        let put = requests.iter().find(|r| r.method.as_str() == "PUT").unwrap();
        let body: serde_json::Value = serde_json::from_slice(&put.body).unwrap();
        assert!(body.get("sha").is_none());
    }

    #[tokio::test]
    async fn test_write_file_with_stale_token_is_conflict() {
        let server = MockServer::start().await;
        // Another writer replaced the file between our token fetch and our write
        Mock::given(method("GET"))
            .and(path("/repos/owner/store/contents/go.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": "seen-sha" })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/repos/owner/store/contents/go.json"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "message": "go.json does not match seen-sha" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(None, server.uri(), None).unwrap();
        let err = client.write_file(REPO, "", "go.json", b"[]").await.unwrap_err();
        match err {
            StoreError::Conflict { path, status } => {
                assert_eq!(path, "go.json");
                assert_eq!(status, 409);
            }
            StoreError::Other(e) => panic!("expected a conflict, got {e:#}"),
        }
    }

    #[tokio::test]
    async fn test_unprocessable_write_is_conflict_only_when_creating() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/owner/store/contents/go.json"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "message": "Invalid request" })))
            .mount(&server)
            .await;

        let client = Client::new(None, server.uri(), None).unwrap();

        let err = client.put_contents(REPO, "go.json", b"[]", None).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { status: 422, .. }));

        let err = client.put_contents(REPO, "go.json", b"[]", Some("seen-sha")).await.unwrap_err();
        assert!(matches!(err, StoreError::Other(_)));
    }

    #[tokio::test]
    async fn test_write_file_server_error_is_not_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/owner/store/contents/go.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/repos/owner/store/contents/go.json"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = Client::new(None, server.uri(), None).unwrap();
        let err = client.write_file(REPO, "", "go.json", b"[]").await.unwrap_err();
        assert!(matches!(err, StoreError::Other(_)));
    }

    #[tokio::test]
    async fn test_list_releases_stops_on_empty_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/golang/go/releases"))
            .and(query_param("per_page", "100"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(release_page_json(100, 0)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/golang/go/releases"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(release_page_json(30, 100)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/golang/go/releases"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(None, server.uri(), None).unwrap();
        let listing = client.list_releases("golang/go").await.unwrap();
        assert_eq!(listing.items.len(), 130);
        assert_eq!(listing.pages, 3);
        assert_eq!(listing.end, PaginationEnd::Exhausted);
        assert_eq!(listing.items[0].tag_name, "v0.0.0");
        assert_eq!(listing.items[129].tag_name, "v0.129.0");
    }

    #[tokio::test]
    async fn test_list_releases_stops_at_ceiling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/busy/repo/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(release_page_json(RELEASES_PAGE_SIZE, 0)))
            .expect(u64::from(MAX_RELEASE_PAGES))
            .mount(&server)
            .await;

        let client = Client::new(None, server.uri(), None).unwrap();
        let listing = client.list_releases("busy/repo").await.unwrap();
        assert_eq!(listing.items.len(), 1000);
        assert_eq!(listing.pages, MAX_RELEASE_PAGES);
        assert!(listing.is_truncated());
    }

    #[tokio::test]
    async fn test_list_releases_propagates_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/gone/repo/releases"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = Client::new(None, server.uri(), None).unwrap();
        let _ = client.list_releases("gone/repo").await.unwrap_err();
    }
}
