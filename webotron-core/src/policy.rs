//! Typed bucket policy documents.
//!
//! Policies are built from a [`Bucket`] handle and serialized with
//! `serde_json`, so the resource ARN always names the bucket it is attached to.

use serde::Serialize;

use crate::contract::Bucket;
use crate::endpoint::Partition;

pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: &'static str,
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub sid: String,
    pub effect: Effect,
    pub principal: Principal,
    pub action: Vec<String>,
    pub resource: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Principal {
    #[serde(rename = "*")]
    Anyone,
}

impl PolicyDocument {
    /// Anonymous `s3:GetObject` on every object in `bucket`.
    pub fn public_read(bucket: &Bucket) -> Self {
        Self {
            version: POLICY_VERSION,
            statement: vec![Statement {
                sid: "PublicReadGetObject".to_string(),
                effect: Effect::Allow,
                principal: Principal::Anyone,
                action: vec!["s3:GetObject".to_string()],
                resource: vec![all_objects_arn(bucket)],
            }],
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn all_objects_arn(bucket: &Bucket) -> String {
    let partition = Partition::for_region(&bucket.region).arn_name();
    format!("arn:{partition}:s3:::{}/*", bucket.name)
}
