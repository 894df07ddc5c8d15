#![doc = "webotron-core: provisioning and sync engine for static websites on object storage."]

//! This crate holds every piece of webotron that has invariants worth testing:
//! bucket provisioning, the tree walker, content typing, sync, catalog
//! listings and website endpoint derivation. It talks to storage only through
//! the [`contract::ObjectStore`] trait; the AWS implementation lives in the
//! `webotron` CLI crate.
//!
//! # Usage
//! Build one store, lend it to [`provision::BucketProvisioner`],
//! [`sync::SyncEngine`] and [`catalog::BucketCatalog`], then hand the bucket
//! to [`endpoint::EndpointResolver`] for its public URL.

pub mod catalog;
pub mod config;
pub mod content_type;
pub mod contract;
pub mod endpoint;
pub mod error;
#[cfg(any(test, feature = "test-export-mocks"))]
pub mod memory;
pub mod policy;
pub mod provision;
pub mod sync;
pub mod walk;
