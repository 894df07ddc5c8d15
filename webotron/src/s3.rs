#![doc = "S3 implementation of the webotron-core ObjectStore contract."]
//
//! # S3 integration (CLI <-> Core)
//!
//! This module bridges the [`ObjectStore`] abstraction in `webotron-core` to
//! AWS S3 through `aws-sdk-s3`. The CLI builds one [`S3Store`] per invocation
//! from the selected profile and region, then lends it to every component.
//!
//! - Credentials and region are resolved once by `aws-config` and never refreshed here.
//! - Every SDK failure becomes a [`StoreError`] carrying the S3 error code.

use std::fmt::Debug;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, ErrorDocument, IndexDocument,
    WebsiteConfiguration,
};
use aws_sdk_s3::Client;
use webotron_core::config::WebsiteConfig;
use webotron_core::contract::{Bucket, ObjectEntry, ObjectStore, Page, UploadUnit};
use webotron_core::error::StoreError;

/// Region S3 treats as the default location; it must not be sent as a constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// Session context: one S3 client plus the region it is bound to.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    region: String,
}

impl S3Store {
    /// Resolve credentials and region once, from `profile` and `region` when
    /// given, falling back to the standard AWS environment and config files.
    pub async fn connect(profile: Option<&str>, region: Option<&str>) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;
        let region = sdk_config
            .region()
            .map(|r| r.as_ref().to_string())
            .ok_or_else(|| {
                tracing::error!(profile = ?profile, "No AWS region configured");
                anyhow!("no AWS region configured; pass --region or set one in the profile")
            })?;
        tracing::info!(profile = ?profile, region = %region, "S3 client initialised");
        Ok(Self {
            client: Client::new(&sdk_config),
            region,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

fn store_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    StoreError {
        operation,
        code,
        message,
    }
}

/// `GetBucketLocation` reports `us-east-1` as no constraint and `eu-west-1` as the legacy `EU`.
fn region_from_location(constraint: Option<&str>) -> String {
    match constraint {
        None | Some("") => DEFAULT_REGION.to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}

/// Buckets listed without a region keep an empty one rather than a guessed one.
fn listed_bucket(name: &str, region: Option<&str>) -> Bucket {
    Bucket::new(name, region.unwrap_or_default())
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn create_bucket(&self, name: &str, region: &str) -> Result<(), StoreError> {
        let mut request = self.client.create_bucket().bucket(name);
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        request
            .send()
            .await
            .map(|_| ())
            .map_err(|e| store_error("CreateBucket", e))
    }

    async fn bucket_region(&self, name: &str) -> Result<String, StoreError> {
        let output = self
            .client
            .get_bucket_location()
            .bucket(name)
            .send()
            .await
            .map_err(|e| store_error("GetBucketLocation", e))?;
        Ok(region_from_location(
            output.location_constraint().map(BucketLocationConstraint::as_str),
        ))
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), StoreError> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| store_error("PutBucketPolicy", e))
    }

    async fn put_bucket_website(
        &self,
        bucket: &str,
        website: &WebsiteConfig,
    ) -> Result<(), StoreError> {
        let build_error = |e: aws_sdk_s3::error::BuildError| {
            StoreError::new("PutBucketWebsite", e.to_string())
        };
        let configuration = WebsiteConfiguration::builder()
            .index_document(
                IndexDocument::builder()
                    .suffix(&website.index_document)
                    .build()
                    .map_err(build_error)?,
            )
            .error_document(
                ErrorDocument::builder()
                    .key(&website.error_document)
                    .build()
                    .map_err(build_error)?,
            )
            .build();
        self.client
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(configuration)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| store_error("PutBucketWebsite", e))
    }

    async fn put_object(&self, bucket: &str, unit: &UploadUnit) -> Result<(), StoreError> {
        let body = ByteStream::from_path(&unit.path).await.map_err(|e| {
            StoreError::new(
                "PutObject",
                format!("open {} for upload: {e}", unit.path.display()),
            )
        })?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(&unit.key)
            .content_type(&unit.content_type)
            .body(body)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| store_error("PutObject", e))
    }

    async fn list_buckets(&self, continuation: Option<String>) -> Result<Page<Bucket>, StoreError> {
        let output = self
            .client
            .list_buckets()
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|e| store_error("ListBuckets", e))?;
        let items = output
            .buckets()
            .iter()
            .filter_map(|b| Some(listed_bucket(b.name()?, b.bucket_region())))
            .collect();
        Ok(Page {
            items,
            next: output.continuation_token().map(str::to_string),
        })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        continuation: Option<String>,
    ) -> Result<Page<ObjectEntry>, StoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|e| store_error("ListObjectsV2", e))?;
        let items = output
            .contents()
            .iter()
            .filter_map(|obj| {
                Some(ObjectEntry {
                    key: obj.key()?.to_string(),
                    size: obj.size().map_or(0, |s| u64::try_from(s).unwrap_or(0)),
                    etag: obj.e_tag().map(str::to_string),
                })
            })
            .collect();
        let next = if output.is_truncated() == Some(true) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };
        Ok(Page { items, next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_constraint_maps_to_region_name() {
        assert_eq!(region_from_location(None), "us-east-1");
        assert_eq!(region_from_location(Some("")), "us-east-1");
        assert_eq!(region_from_location(Some("EU")), "eu-west-1");
        assert_eq!(region_from_location(Some("ap-south-1")), "ap-south-1");
    }

    #[test]
    fn listed_bucket_without_region_is_not_guessed() {
        assert_eq!(listed_bucket("site", None), Bucket::new("site", ""));
        assert_eq!(
            listed_bucket("site", Some("eu-central-1")),
            Bucket::new("site", "eu-central-1")
        );
    }
}
