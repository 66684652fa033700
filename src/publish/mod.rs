//! Publish pipeline
//!
//! Decides whether a collector's artifact differs from what was last published, and if so
//! writes it locally and to the remote store. The change ledger and homepage index live as
//! whole-file JSON maps in the work directory.

mod artifact;
mod json_map;
mod ledger;
mod publisher;

pub use artifact::{Artifact, VersionRecord};
pub use ledger::{
    AGGREGATE_FILE_NAME, ChangeLedger, HomepageIndex, INDEX_UPLOADED_FILE_NAME, SDK_LIST_FILE_NAME, SHA_FILE_NAME, content_hash,
    is_reserved_name,
};
pub use publisher::{PublishError, PublishOptions, PublishStatus, Publisher};
