use crate::publish::{PublishError, PublishStatus};
use core::fmt;

/// Why one collector produced no published artifact
#[derive(Debug)]
pub enum Failure {
    /// The collector's `start` returned an error.
    Collect(ohno::AppError),

    /// The collector panicked; the payload message is kept when there is one.
    Panicked(String),

    /// The remote write kept hitting a stale version token.
    Conflict { path: String },

    /// Publishing failed for any other reason.
    Publish(ohno::AppError),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collect(e) => write!(f, "collection failed: {e:#}"),
            Self::Panicked(msg) => write!(f, "collector panicked: {msg}"),
            Self::Conflict { path } => write!(f, "concurrent update of '{path}' in the remote store"),
            Self::Publish(e) => write!(f, "publish failed: {e:#}"),
        }
    }
}

impl From<PublishError> for Failure {
    fn from(e: PublishError) -> Self {
        match e {
            PublishError::Conflict { path } => Self::Conflict { path },
            PublishError::Store(e) | PublishError::Local(e) => Self::Publish(e),
        }
    }
}

/// What happened to one collector during a run
#[derive(Debug)]
pub enum Outcome {
    Published,
    Unchanged,
    Empty,
    Failed(Failure),
}

impl From<PublishStatus> for Outcome {
    fn from(status: PublishStatus) -> Self {
        match status {
            PublishStatus::Published => Self::Published,
            PublishStatus::Unchanged => Self::Unchanged,
            PublishStatus::Empty => Self::Empty,
        }
    }
}

#[derive(Debug)]
pub struct ItemReport {
    pub sdk_name: String,
    pub outcome: Outcome,
}

impl ItemReport {
    #[must_use]
    pub fn new(sdk_name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            sdk_name: sdk_name.into(),
            outcome,
        }
    }

    #[must_use]
    pub fn failed(sdk_name: impl Into<String>, failure: Failure) -> Self {
        Self::new(sdk_name, Outcome::Failed(failure))
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match &self.outcome {
            Outcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}
