//! # contract: the object-storage seam
//!
//! This module defines the single trait ([`ObjectStore`]) through which every
//! webotron component talks to a storage service, plus the plain data types
//! that cross it.
//!
//! ## Interface & Extensibility
//! - Implement [`ObjectStore`] to target a storage backend. The CLI crate
//!   provides the S3 implementation; [`crate::memory::MemoryStore`] is an
//!   in-process fake.
//! - All methods are async and blocking from the caller's point of view: each
//!   resolves once the remote call has succeeded or failed.
//! - Errors are uniform: every failure is a [`StoreError`] carrying the
//!   operation name and, when available, the provider error code.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, so consumers get a
//!   `MockObjectStore` under the `test-export-mocks` feature.

use std::path::PathBuf;

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::config::WebsiteConfig;
use crate::error::StoreError;

/// Handle to a bucket the caller has created, adopted or listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bucket {
    pub name: String,
    pub region: String,
}

impl Bucket {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
        }
    }
}

/// One object as reported by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    /// Entity tag as returned by the service, quotes included.
    pub etag: Option<String>,
}

/// A single local file bound for a single key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadUnit {
    pub path: PathBuf,
    pub key: String,
    pub content_type: String,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token for the next page; `None` on the last page.
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Storage operations required by provisioning, sync and catalog queries.
///
/// Implementors own their credentials and client state; callers construct
/// one store per invocation and lend it to each component.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create `name` in `region`. An already-owned bucket must fail with
    /// code [`BUCKET_ALREADY_OWNED_BY_YOU`](crate::error::BUCKET_ALREADY_OWNED_BY_YOU).
    async fn create_bucket(&self, name: &str, region: &str) -> Result<(), StoreError>;

    /// Region the bucket lives in, as a region name (never empty).
    async fn bucket_region(&self, name: &str) -> Result<String, StoreError>;

    /// Replace the bucket policy with `policy` (a JSON document).
    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), StoreError>;

    /// Replace the static-website configuration in one call.
    async fn put_bucket_website(
        &self,
        bucket: &str,
        website: &WebsiteConfig,
    ) -> Result<(), StoreError>;

    /// Upload the file at `unit.path` under `unit.key`, tagged with `unit.content_type`.
    async fn put_object(&self, bucket: &str, unit: &UploadUnit) -> Result<(), StoreError>;

    async fn list_buckets(&self, continuation: Option<String>) -> Result<Page<Bucket>, StoreError>;

    async fn list_objects(
        &self,
        bucket: &str,
        continuation: Option<String>,
    ) -> Result<Page<ObjectEntry>, StoreError>;
}
