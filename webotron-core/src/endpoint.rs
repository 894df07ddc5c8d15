//! Public website endpoint derivation for S3 buckets.
//!
//! Pure string work: no network calls are made. Regions launched before 2014
//! use a dash between `s3-website` and the region, later ones a dot.

use std::net::Ipv4Addr;

use crate::contract::Bucket;
use crate::error::InvalidBucketError;

const DASH_REGIONS: &[&str] = &[
    "us-east-1",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "sa-east-1",
    "us-gov-west-1",
];

/// AWS partition a region belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Aws,
    China,
    GovCloud,
}

impl Partition {
    pub fn for_region(region: &str) -> Self {
        if region.starts_with("cn-") {
            Partition::China
        } else if region.starts_with("us-gov-") {
            Partition::GovCloud
        } else {
            Partition::Aws
        }
    }

    /// Prefix used in ARNs, e.g. `arn:aws-cn:...`.
    pub fn arn_name(self) -> &'static str {
        match self {
            Partition::Aws => "aws",
            Partition::China => "aws-cn",
            Partition::GovCloud => "aws-us-gov",
        }
    }

    pub fn dns_suffix(self) -> &'static str {
        match self {
            Partition::China => "amazonaws.com.cn",
            Partition::Aws | Partition::GovCloud => "amazonaws.com",
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
}

fn is_edge_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

/// Check `name` against S3 bucket naming rules.
pub fn validate_bucket_name(name: &str) -> Result<(), InvalidBucketError> {
    let invalid = |reason| InvalidBucketError {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("bucket name is empty"));
    }
    if name.len() < 3 || name.len() > 63 {
        return Err(invalid("bucket name must be 3 to 63 characters long"));
    }
    let starts_and_ends_alphanumeric = name.chars().next().is_some_and(is_edge_char)
        && name.chars().last().is_some_and(is_edge_char);
    if !name.chars().all(is_name_char) || !starts_and_ends_alphanumeric {
        return Err(invalid(
            "bucket name may only contain lowercase letters, digits, dots and hyphens, \
             and must start and end with a letter or digit",
        ));
    }
    if name.contains("..") {
        return Err(invalid("bucket name must not contain adjacent dots"));
    }
    if name.parse::<Ipv4Addr>().is_ok() {
        return Err(invalid("bucket name must not be formatted as an IP address"));
    }
    Ok(())
}

/// Derives the public static-website URL of a bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointResolver;

impl EndpointResolver {
    pub fn website_url(&self, bucket: &Bucket) -> Result<String, InvalidBucketError> {
        validate_bucket_name(&bucket.name)?;
        let region = bucket.region.trim();
        if region.is_empty() {
            return Err(InvalidBucketError {
                name: bucket.name.clone(),
                reason: "bucket has no region",
            });
        }
        Ok(format!(
            "http://{}.{}",
            bucket.name,
            website_host_suffix(region)
        ))
    }
}

/// Host part after the bucket name, e.g. `s3-website-us-east-1.amazonaws.com`.
fn website_host_suffix(region: &str) -> String {
    let separator = if DASH_REGIONS.contains(&region) { '-' } else { '.' };
    let suffix = Partition::for_region(region).dns_suffix();
    format!("s3-website{separator}{region}.{suffix}")
}
