//! Error taxonomy for provisioning, sync and catalog operations.
//!
//! Every error names the remote operation that failed together with the
//! bucket (and key, where one is involved). Store-level failures are carried
//! as [`StoreError`] sources so callers can inspect the provider error code.

use std::io;
use std::path::PathBuf;

use crate::provision::BucketState;
use crate::sync::SyncReport;

/// Failure reported by an [`ObjectStore`](crate::contract::ObjectStore) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} failed: {message}")]
pub struct StoreError {
    /// Remote operation name, e.g. `CreateBucket`.
    pub operation: &'static str,
    /// Provider error code, when the service returned one.
    pub code: Option<String>,
    pub message: String,
}

/// Provider code for a create on a bucket the caller already owns.
pub const BUCKET_ALREADY_OWNED_BY_YOU: &str = "BucketAlreadyOwnedByYou";
/// Provider code for a create on a bucket owned by another account.
pub const BUCKET_ALREADY_EXISTS: &str = "BucketAlreadyExists";

impl StoreError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn is_bucket_already_owned_by_you(&self) -> bool {
        self.code() == Some(BUCKET_ALREADY_OWNED_BY_YOU)
    }
}

/// Creating or adopting a bucket failed.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    #[error("create bucket `{bucket}` in {region} failed: {source}")]
    Rejected {
        bucket: String,
        region: String,
        #[source]
        source: StoreError,
    },
    #[error("bucket `{bucket}` is already owned by you in {actual}, not {requested}")]
    RegionMismatch {
        bucket: String,
        requested: String,
        actual: String,
    },
}

impl ProvisioningError {
    pub fn bucket(&self) -> &str {
        match self {
            ProvisioningError::Rejected { bucket, .. }
            | ProvisioningError::RegionMismatch { bucket, .. } => bucket,
        }
    }

    /// Provider error code, if the store rejected the request.
    pub fn code(&self) -> Option<&str> {
        match self {
            ProvisioningError::Rejected { source, .. } => source.code(),
            ProvisioningError::RegionMismatch { .. } => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("policy document for bucket `{bucket}` could not be serialized: {source}")]
    Serialize {
        bucket: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("put policy on bucket `{bucket}` failed: {source}")]
    Rejected {
        bucket: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("website configuration for bucket `{bucket}` is invalid: {reason}")]
    Invalid { bucket: String, reason: &'static str },
    #[error("put website configuration on bucket `{bucket}` failed: {source}")]
    Rejected {
        bucket: String,
        #[source]
        source: StoreError,
    },
}

/// Full provisioning run failed at one of its steps.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl SetupError {
    /// Last lifecycle state the bucket is known to have reached.
    pub fn reached(&self) -> BucketState {
        match self {
            SetupError::Provisioning(_) => BucketState::Absent,
            SetupError::Policy(_) => BucketState::Created,
            SetupError::Configuration(_) => BucketState::PolicyApplied,
        }
    }
}

/// A directory or file could not be traversed.
#[derive(Debug, thiserror::Error)]
#[error("cannot walk {}: {source}", .path.display())]
pub struct WalkError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl WalkError {
    pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// One file could not be synced. Collected, never fatal on its own.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("walk failed at `{key}`: {source}")]
    Walk {
        key: String,
        #[source]
        source: WalkError,
    },
    #[error("read of `{key}` from {} failed: {source}", .path.display())]
    Read {
        key: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("upload of `{key}` to bucket `{bucket}` failed: {source}")]
    Rejected {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },
}

impl UploadError {
    pub fn key(&self) -> &str {
        match self {
            UploadError::Walk { key, .. }
            | UploadError::Read { key, .. }
            | UploadError::Rejected { key, .. } => key,
        }
    }
}

/// A listing failed part-way. Items already yielded stay valid.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("list buckets failed: {source}")]
    Buckets {
        #[source]
        source: StoreError,
    },
    #[error("list objects of bucket `{bucket}` failed: {source}")]
    Objects {
        bucket: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid bucket `{name}`: {reason}")]
pub struct InvalidBucketError {
    pub name: String,
    pub reason: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("sync root is not walkable: {0}")]
    Root(#[source] WalkError),
    #[error("could not list remote objects for comparison: {0}")]
    Catalog(#[source] CatalogError),
    #[error(
        "sync to bucket `{}` incomplete: {} file(s) failed ({})",
        .report.bucket,
        .failures.len(),
        failed_keys(.failures)
    )]
    Incomplete {
        report: SyncReport,
        failures: Vec<UploadError>,
    },
}

impl SyncError {
    /// Keys that failed, empty for fatal errors.
    pub fn failed_keys(&self) -> Vec<&str> {
        match self {
            SyncError::Incomplete { failures, .. } => failures.iter().map(UploadError::key).collect(),
            _ => Vec::new(),
        }
    }
}

fn failed_keys(failures: &[UploadError]) -> String {
    failures
        .iter()
        .map(UploadError::key)
        .collect::<Vec<_>>()
        .join(", ")
}
