//! In-process [`ObjectStore`] with per-account bucket ownership.
//!
//! Several `MemoryStore` handles can share one backing [`MemoryService`],
//! each acting as a different account, which is how ownership conflicts are
//! modelled. `put_object` reads the local file for real, so unreadable files
//! fail exactly as they would against a remote service.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use md5::{Digest, Md5};

use crate::config::WebsiteConfig;
use crate::contract::{Bucket, ObjectEntry, ObjectStore, Page, UploadUnit};
use crate::error::{StoreError, BUCKET_ALREADY_EXISTS, BUCKET_ALREADY_OWNED_BY_YOU};

/// Code returned when an owned bucket is re-created with another region.
pub const ILLEGAL_LOCATION_CONSTRAINT: &str = "IllegalLocationConstraintException";

/// A stored object as seen by tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub etag: String,
}

#[derive(Debug, Clone, Default)]
pub struct BucketRecord {
    pub owner: String,
    pub region: String,
    pub policy: Option<String>,
    pub website: Option<WebsiteConfig>,
    pub objects: BTreeMap<String, StoredObject>,
}

#[derive(Debug, Default)]
struct ServiceState {
    buckets: BTreeMap<String, BucketRecord>,
    put_counts: HashMap<String, usize>,
}

/// Shared backing state for one or more [`MemoryStore`] accounts.
#[derive(Debug, Clone, Default)]
pub struct MemoryService {
    state: Arc<Mutex<ServiceState>>,
    page_size: Option<usize>,
}

impl MemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split listings into pages of at most `size` items.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size.max(1));
        self
    }

    pub fn account(&self, account: impl Into<String>) -> MemoryStore {
        MemoryStore {
            service: self.clone(),
            account: account.into(),
        }
    }

    pub fn bucket(&self, name: &str) -> Option<BucketRecord> {
        self.lock().buckets.get(name).cloned()
    }

    /// How many times `put_object` succeeded for `bucket/key`.
    pub fn put_count(&self, bucket: &str, key: &str) -> usize {
        self.lock()
            .put_counts
            .get(&format!("{bucket}/{key}"))
            .copied()
            .unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn paginate<T: Clone>(&self, items: Vec<T>, continuation: Option<String>) -> Result<Page<T>, StoreError> {
        let start = match continuation {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| StoreError::new("List", format!("invalid continuation token `{token}`")))?,
        };
        let size = self.page_size.unwrap_or(usize::MAX);
        let end = start.saturating_add(size).min(items.len());
        let next = (end < items.len()).then(|| end.to_string());
        Ok(Page {
            items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
            next,
        })
    }
}

/// One account's view of a [`MemoryService`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    service: MemoryService,
    account: String,
}

impl MemoryStore {
    /// A store backed by its own fresh service.
    pub fn new(account: impl Into<String>) -> Self {
        MemoryService::new().account(account)
    }

    pub fn service(&self) -> &MemoryService {
        &self.service
    }

    fn with_owned_bucket<T>(
        &self,
        operation: &'static str,
        bucket: &str,
        f: impl FnOnce(&mut BucketRecord) -> T,
    ) -> Result<T, StoreError> {
        let mut state = self.service.lock();
        match state.buckets.get_mut(bucket) {
            Some(record) if record.owner == self.account => Ok(f(record)),
            Some(_) => Err(StoreError::new(operation, "Access Denied").with_code("AccessDenied")),
            None => Err(StoreError::new(operation, "The specified bucket does not exist")
                .with_code("NoSuchBucket")),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn create_bucket(&self, name: &str, region: &str) -> Result<(), StoreError> {
        let mut state = self.service.lock();
        match state.buckets.get(name) {
            Some(record) if record.owner != self.account => Err(StoreError::new(
                "CreateBucket",
                "The requested bucket name is not available.",
            )
            .with_code(BUCKET_ALREADY_EXISTS)),
            Some(record) if record.region != region => Err(StoreError::new(
                "CreateBucket",
                format!(
                    "The {region} location constraint is incompatible with the region ({}) \
                     the bucket already lives in.",
                    record.region
                ),
            )
            .with_code(ILLEGAL_LOCATION_CONSTRAINT)),
            Some(_) => Err(StoreError::new(
                "CreateBucket",
                "Your previous request to create the named bucket succeeded and you already own it.",
            )
            .with_code(BUCKET_ALREADY_OWNED_BY_YOU)),
            None => {
                state.buckets.insert(
                    name.to_string(),
                    BucketRecord {
                        owner: self.account.clone(),
                        region: region.to_string(),
                        ..BucketRecord::default()
                    },
                );
                Ok(())
            }
        }
    }

    async fn bucket_region(&self, name: &str) -> Result<String, StoreError> {
        self.with_owned_bucket("GetBucketLocation", name, |record| record.region.clone())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), StoreError> {
        serde_json::from_str::<serde_json::Value>(policy).map_err(|e| {
            StoreError::new("PutBucketPolicy", format!("Policies must be valid JSON: {e}"))
                .with_code("MalformedPolicy")
        })?;
        self.with_owned_bucket("PutBucketPolicy", bucket, |record| {
            record.policy = Some(policy.to_string());
        })
    }

    async fn put_bucket_website(
        &self,
        bucket: &str,
        website: &WebsiteConfig,
    ) -> Result<(), StoreError> {
        self.with_owned_bucket("PutBucketWebsite", bucket, |record| {
            record.website = Some(website.clone());
        })
    }

    async fn put_object(&self, bucket: &str, unit: &UploadUnit) -> Result<(), StoreError> {
        let body = tokio::fs::read(&unit.path)
            .await
            .map_err(|e| StoreError::new("PutObject", format!("{}: {e}", unit.path.display())))?;
        let etag = format!("\"{}\"", hex::encode(Md5::digest(&body)));
        self.with_owned_bucket("PutObject", bucket, |record| {
            record.objects.insert(
                unit.key.clone(),
                StoredObject {
                    body,
                    content_type: unit.content_type.clone(),
                    etag,
                },
            );
        })?;
        *self
            .service
            .lock()
            .put_counts
            .entry(format!("{bucket}/{}", unit.key))
            .or_default() += 1;
        Ok(())
    }

    async fn list_buckets(&self, continuation: Option<String>) -> Result<Page<Bucket>, StoreError> {
        let buckets: Vec<Bucket> = self
            .service
            .lock()
            .buckets
            .iter()
            .filter(|(_, record)| record.owner == self.account)
            .map(|(name, record)| Bucket::new(name.clone(), record.region.clone()))
            .collect();
        self.service.paginate(buckets, continuation)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        continuation: Option<String>,
    ) -> Result<Page<ObjectEntry>, StoreError> {
        let entries = self.with_owned_bucket("ListObjectsV2", bucket, |record| {
            record
                .objects
                .iter()
                .map(|(key, object)| ObjectEntry {
                    key: key.clone(),
                    size: object.body.len() as u64,
                    etag: Some(object.etag.clone()),
                })
                .collect::<Vec<_>>()
        })?;
        self.service.paginate(entries, continuation)
    }
}
