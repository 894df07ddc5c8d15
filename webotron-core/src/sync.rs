//! Local-to-bucket synchronisation.
//!
//! Drives a [`TreeWalker`] over the sync root, tags each file with a content
//! type from [`ContentTypeResolver`], and uploads it through the
//! [`ObjectStore`] under its relative key.
//!
//! # Semantics
//! - Best effort: a failure on one file is logged and collected, every other
//!   file is still attempted. Any failure turns the result into
//!   [`SyncError::Incomplete`], listing the failed keys in key order.
//! - By default every file is re-uploaded on every run. With
//!   [`SyncOptions::skip_unchanged`] the remote ETags are listed first and
//!   files whose MD5 matches are left alone.
//! - Uploads to distinct keys are independent and run concurrently, up to
//!   [`SyncOptions::concurrency`] at a time.
//! - The tree is walked up front on the blocking pool, so directory reads
//!   never stall the executor. Uploads start once the walk has finished.
//! - Files are opened before upload. A file that cannot be opened fails as
//!   [`UploadError::Read`], distinct from a rejected upload.
//! - Nothing is retried. Re-running a partially failed sync is always safe.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt, TryStreamExt};
use md5::{Digest, Md5};
use tracing::{debug, error, info};

use crate::catalog::BucketCatalog;
use crate::config::SyncOptions;
use crate::content_type::ContentTypeResolver;
use crate::contract::{Bucket, ObjectStore, UploadUnit};
use crate::error::{SyncError, UploadError, WalkError};
use crate::walk::{TreeWalker, Walk, WalkEntry};

/// Outcome of a sync run. Keys are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub bucket: String,
    pub uploaded: Vec<String>,
    pub skipped: Vec<String>,
}

enum Outcome {
    Uploaded(String),
    Skipped(String),
    Failed(UploadError),
}

pub struct SyncEngine<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    resolver: ContentTypeResolver,
    options: SyncOptions,
}

impl<'a, S: ObjectStore + ?Sized> SyncEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            resolver: ContentTypeResolver::default(),
            options: SyncOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_resolver(mut self, resolver: ContentTypeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub async fn sync(&self, root: &Path, bucket: &Bucket) -> Result<SyncReport, SyncError> {
        let (walked_root, entries) = walk_blocking(root).await.map_err(|e| {
            error!(root = %root.display(), error = %e, "[SYNC][ERROR] Sync root is not walkable");
            SyncError::Root(e)
        })?;
        info!(
            root = %walked_root.display(),
            bucket = %bucket.name,
            files = entries.len(),
            concurrency = self.options.concurrency,
            skip_unchanged = self.options.skip_unchanged,
            "[SYNC] Starting sync"
        );

        let remote = if self.options.skip_unchanged {
            self.remote_etags(bucket).await?
        } else {
            HashMap::new()
        };

        let outcomes: Vec<Outcome> = stream::iter(entries)
            .map(|entry| self.sync_entry(entry, bucket, &remote))
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;

        let mut report = SyncReport {
            bucket: bucket.name.clone(),
            ..SyncReport::default()
        };
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Uploaded(key) => report.uploaded.push(key),
                Outcome::Skipped(key) => report.skipped.push(key),
                Outcome::Failed(e) => failures.push(e),
            }
        }
        report.uploaded.sort();
        report.skipped.sort();
        failures.sort_by(|a, b| a.key().cmp(b.key()));

        info!(
            bucket = %bucket.name,
            uploaded = report.uploaded.len(),
            skipped = report.skipped.len(),
            failed = failures.len(),
            "[SYNC] Sync finished"
        );
        if failures.is_empty() {
            Ok(report)
        } else {
            Err(SyncError::Incomplete { report, failures })
        }
    }

    async fn sync_entry(
        &self,
        entry: KeyedEntry,
        bucket: &Bucket,
        remote: &HashMap<String, String>,
    ) -> Outcome {
        let entry = match entry {
            Ok(entry) => entry,
            Err((key, source)) => {
                error!(key = %key, error = %source, "[SYNC][ERROR] Walk failed");
                return Outcome::Failed(UploadError::Walk { key, source });
            }
        };

        if let Some(etag) = remote.get(&entry.key) {
            match file_md5(&entry.path).await {
                Ok(local) if local == *etag => {
                    debug!(key = %entry.key, "[SYNC] Unchanged, skipping");
                    return Outcome::Skipped(entry.key);
                }
                Ok(_) => {}
                Err(source) => {
                    error!(key = %entry.key, error = %source, "[SYNC][ERROR] Failed to read file for comparison");
                    return Outcome::Failed(UploadError::Read {
                        key: entry.key,
                        path: entry.path,
                        source,
                    });
                }
            }
        }

        if let Err(source) = tokio::fs::File::open(&entry.path).await {
            error!(key = %entry.key, error = %source, "[SYNC][ERROR] Failed to open file for upload");
            return Outcome::Failed(UploadError::Read {
                key: entry.key,
                path: entry.path,
                source,
            });
        }

        let unit = UploadUnit {
            content_type: self.resolver.resolve(&entry.key),
            path: entry.path,
            key: entry.key,
        };
        debug!(key = %unit.key, content_type = %unit.content_type, "[SYNC][UPLOAD] Uploading file");
        match self.store.put_object(&bucket.name, &unit).await {
            Ok(()) => {
                info!(key = %unit.key, content_type = %unit.content_type, "[SYNC][UPLOAD] Uploaded");
                Outcome::Uploaded(unit.key)
            }
            Err(source) => {
                error!(key = %unit.key, bucket = %bucket.name, error = %source, "[SYNC][ERROR][UPLOAD] Upload failed");
                Outcome::Failed(UploadError::Rejected {
                    bucket: bucket.name.clone(),
                    key: unit.key,
                    source,
                })
            }
        }
    }

    /// Key → unquoted ETag for every object already in the bucket.
    async fn remote_etags(&self, bucket: &Bucket) -> Result<HashMap<String, String>, SyncError> {
        let entries: Vec<_> = BucketCatalog::new(self.store)
            .list_objects(&bucket.name)
            .try_collect()
            .await
            .map_err(|e| {
                error!(bucket = %bucket.name, error = %e, "[SYNC][ERROR] Could not list remote objects");
                SyncError::Catalog(e)
            })?;
        let etags: HashMap<_, _> = entries
            .into_iter()
            .filter_map(|entry| {
                let etag = entry.etag?.trim_matches('"').to_ascii_lowercase();
                Some((entry.key, etag))
            })
            .collect();
        debug!(bucket = %bucket.name, objects = etags.len(), "[SYNC] Loaded remote ETags");
        Ok(etags)
    }
}

type KeyedEntry = Result<WalkEntry, (String, WalkError)>;

/// Run the whole walk on the blocking pool. Returns the canonical root and every entry.
async fn walk_blocking(root: &Path) -> Result<(PathBuf, Vec<KeyedEntry>), WalkError> {
    let owned = root.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<(PathBuf, Vec<KeyedEntry>), WalkError> {
        let walk = TreeWalker::walk(&owned)?;
        let canonical = walk.root().to_path_buf();
        Ok((canonical, entries_with_keys(walk).collect()))
    })
    .await
    .map_err(|e| WalkError::new(root, io::Error::other(e)))?
}

/// Attach a best-effort key to walk errors so they can be reported per file.
fn entries_with_keys(walk: Walk) -> impl Iterator<Item = KeyedEntry> {
    let root = walk.root().to_path_buf();
    walk.map(move |item| {
        item.map_err(|e| {
            let key = match e.path.strip_prefix(&root) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().replace('\\', "/"),
                _ => e.path.display().to_string(),
            };
            (key, e)
        })
    })
}

async fn file_md5(path: &Path) -> io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(hex::encode(Md5::digest(&bytes)))
}
