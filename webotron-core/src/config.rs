use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Static-website hosting configuration. Both documents are always set together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebsiteConfig {
    pub index_document: String,
    pub error_document: String,
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            index_document: "index.html".to_string(),
            error_document: "error.html".to_string(),
        }
    }
}

impl WebsiteConfig {
    pub fn trace_loaded(&self) {
        info!(
            index_document = %self.index_document,
            error_document = %self.error_document,
            "Loaded website config"
        );
    }
}

pub const DEFAULT_CONCURRENCY: usize = 8;

/// Options controlling a single sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Maximum uploads in flight. Values below 1 are treated as 1.
    pub concurrency: usize,
    /// Skip files whose MD5 matches the remote ETag.
    pub skip_unchanged: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            skip_unchanged: false,
        }
    }
}

impl SyncOptions {
    pub fn trace_loaded(&self) {
        info!(
            concurrency = self.concurrency,
            skip_unchanged = self.skip_unchanged,
            "Loaded sync options"
        );
        debug!(?self, "Sync options loaded (full debug)");
    }
}
