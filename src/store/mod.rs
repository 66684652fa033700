//! Remote content store
//!
//! A GitHub repository is used as a content-addressable blob store. Reads go through the
//! contents endpoint (to learn a file's current version token) and the paginated releases
//! endpoint; writes are conditional uploads guarded by that token.

mod client;
mod releases;

pub use client::{Client, DEFAULT_API_BASE_URL, MAX_RELEASE_PAGES, RELEASES_PAGE_SIZE, StoreError, WriteReceipt, remote_path};
pub use releases::{Asset, PaginationEnd, ReleaseItem, ReleaseListing};
