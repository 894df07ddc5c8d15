//! Bucket provisioning: create or adopt, open for public read, enable website hosting.
//!
//! Each step is idempotent in effect and always performs its remote call.
//! Steps never roll back: a failed policy upload leaves the bucket created but
//! not public, and re-running [`BucketProvisioner::provision`] resumes safely.

use std::fmt;

use tracing::{error, info};

use crate::config::WebsiteConfig;
use crate::contract::{Bucket, ObjectStore};
use crate::error::{ConfigurationError, PolicyError, ProvisioningError, SetupError, StoreError};
use crate::policy::PolicyDocument;

/// Lifecycle of a bucket as seen by the provisioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BucketState {
    Absent,
    Created,
    PolicyApplied,
    WebsiteConfigured,
}

impl fmt::Display for BucketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BucketState::Absent => "absent",
            BucketState::Created => "created",
            BucketState::PolicyApplied => "policy-applied",
            BucketState::WebsiteConfigured => "website-configured",
        };
        f.write_str(name)
    }
}

pub struct BucketProvisioner<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ObjectStore + ?Sized> BucketProvisioner<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create `name` in `region`, adopting it if the caller already owns it
    /// there. An owned bucket in any other region is an error.
    pub async fn create_or_adopt(
        &self,
        name: &str,
        region: &str,
    ) -> Result<Bucket, ProvisioningError> {
        info!(bucket = %name, region = %region, "[SETUP] Creating bucket");
        let rejected = |source: StoreError| {
            error!(bucket = %name, region = %region, error = %source, "[SETUP][ERROR] Bucket creation failed");
            ProvisioningError::Rejected {
                bucket: name.to_string(),
                region: region.to_string(),
                source,
            }
        };
        match self.store.create_bucket(name, region).await {
            Ok(()) => {
                info!(bucket = %name, "[SETUP] Bucket created");
            }
            Err(e) if e.is_bucket_already_owned_by_you() => {
                let actual = self.store.bucket_region(name).await.map_err(rejected)?;
                if actual != region {
                    error!(
                        bucket = %name,
                        requested = %region,
                        actual = %actual,
                        "[SETUP][ERROR] Owned bucket lives in another region"
                    );
                    return Err(ProvisioningError::RegionMismatch {
                        bucket: name.to_string(),
                        requested: region.to_string(),
                        actual,
                    });
                }
                info!(bucket = %name, "[SETUP] Bucket already owned by caller, adopting it");
            }
            Err(e) => return Err(rejected(e)),
        }
        Ok(Bucket::new(name, region))
    }

    /// Overwrite the bucket policy with anonymous read on every object.
    pub async fn apply_public_read_policy(&self, bucket: &Bucket) -> Result<(), PolicyError> {
        let policy = PolicyDocument::public_read(bucket)
            .to_json()
            .map_err(|source| PolicyError::Serialize {
                bucket: bucket.name.clone(),
                source,
            })?;
        info!(bucket = %bucket.name, "[SETUP] Applying public-read policy");
        self.store
            .put_bucket_policy(&bucket.name, &policy)
            .await
            .map_err(|source| {
                error!(bucket = %bucket.name, error = %source, "[SETUP][ERROR] Policy rejected");
                PolicyError::Rejected {
                    bucket: bucket.name.clone(),
                    source,
                }
            })
    }

    /// Set index and error documents in a single configuration call.
    pub async fn configure_website(
        &self,
        bucket: &Bucket,
        website: &WebsiteConfig,
    ) -> Result<(), ConfigurationError> {
        let invalid = |reason| ConfigurationError::Invalid {
            bucket: bucket.name.clone(),
            reason,
        };
        if website.index_document.trim().is_empty() {
            return Err(invalid("index document name is empty"));
        }
        if website.error_document.trim().is_empty() {
            return Err(invalid("error document name is empty"));
        }
        info!(
            bucket = %bucket.name,
            index_document = %website.index_document,
            error_document = %website.error_document,
            "[SETUP] Configuring static website hosting"
        );
        self.store
            .put_bucket_website(&bucket.name, website)
            .await
            .map_err(|source| {
                error!(bucket = %bucket.name, error = %source, "[SETUP][ERROR] Website configuration rejected");
                ConfigurationError::Rejected {
                    bucket: bucket.name.clone(),
                    source,
                }
            })
    }

    /// Run every provisioning step in order, stopping at the first failure.
    pub async fn provision(
        &self,
        name: &str,
        region: &str,
        website: &WebsiteConfig,
    ) -> Result<Bucket, SetupError> {
        let result = self.run_steps(name, region, website).await;
        match &result {
            Ok(_) => info!(bucket = %name, state = %BucketState::WebsiteConfigured, "[SETUP] Provisioning complete"),
            Err(e) => error!(bucket = %name, reached = %e.reached(), error = %e, "[SETUP][ERROR] Provisioning stopped"),
        }
        result
    }

    async fn run_steps(
        &self,
        name: &str,
        region: &str,
        website: &WebsiteConfig,
    ) -> Result<Bucket, SetupError> {
        let bucket = self.create_or_adopt(name, region).await?;
        self.apply_public_read_policy(&bucket).await?;
        self.configure_website(&bucket, website).await?;
        Ok(bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_ordered_along_the_lifecycle() {
        assert!(BucketState::Absent < BucketState::Created);
        assert!(BucketState::Created < BucketState::PolicyApplied);
        assert!(BucketState::PolicyApplied < BucketState::WebsiteConfigured);
        assert_eq!(BucketState::PolicyApplied.to_string(), "policy-applied");
    }
}
