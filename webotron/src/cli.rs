///
/// This module implements the CLI interface for webotron: command parsing,
/// settings precedence, and user-visible output.
///
/// All provisioning, walking, syncing and listing logic lives in the
/// [`webotron-core`] crate. This module only wires an [`S3Store`] into the
/// core components and prints their results.
///
/// ## Output
/// - Listings and URLs go to stdout, one record per line, tab separated.
/// - Diagnostics go to stderr through `tracing`.
///
/// ## How To Use
/// - For command-line users: run the `webotron` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`webotron-core`]: ../../webotron_core/
/// [`S3Store`]: crate::s3::S3Store
use crate::load_config::{load_optional_config, CliConfig};
use crate::s3::S3Store;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::stream::TryStreamExt;
use std::path::PathBuf;
use webotron_core::catalog::BucketCatalog;
use webotron_core::contract::Bucket;
use webotron_core::endpoint::{validate_bucket_name, EndpointResolver};
use webotron_core::provision::BucketProvisioner;
use webotron_core::sync::SyncEngine;

/// CLI for webotron: deploy static websites to S3.
#[derive(Parser, Debug)]
#[clap(
    name = "webotron",
    version,
    about = "Provision S3 buckets as public static websites and sync local directories to them"
)]
pub struct Cli {
    /// AWS named profile to use for credentials and region
    #[clap(long, global = true)]
    pub profile: Option<String>,

    /// AWS region; overrides the profile and config file
    #[clap(long, global = true)]
    pub region: Option<String>,

    /// Path to an optional YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every bucket visible to the caller
    ListBuckets,
    /// List every object in a bucket
    ListBucketObjects {
        bucket: String,
    },
    /// Create a bucket and configure it as a public static website
    SetupBucket {
        bucket: String,
        /// Document served for directory requests
        #[clap(long)]
        index_document: Option<String>,
        /// Document served on errors
        #[clap(long)]
        error_document: Option<String>,
    },
    /// Upload every file under a local directory to a bucket
    Sync {
        path: PathBuf,
        bucket: String,
        /// Maximum number of uploads in flight
        #[clap(long)]
        concurrency: Option<usize>,
        /// Skip files whose content already matches the remote object
        #[clap(long)]
        skip_unchanged: bool,
    },
    /// Print the public website URL of a bucket
    WebsiteUrl {
        bucket: String,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let settings = load_optional_config(cli.config.as_deref())?
        .with_overrides(cli.profile, cli.region);

    match cli.command {
        Commands::ListBuckets => {
            tracing::info!(command = "list-buckets", "Listing buckets");
            let store = connect(&settings).await?;
            let buckets: Vec<Bucket> = BucketCatalog::new(&store)
                .list_buckets()
                .try_collect()
                .await
                .context("listing buckets failed")?;
            for bucket in buckets {
                println!("{}\t{}", bucket.name, bucket.region);
            }
            Ok(())
        }
        Commands::ListBucketObjects { bucket } => {
            tracing::info!(command = "list-bucket-objects", bucket = %bucket, "Listing objects");
            validate_bucket_name(&bucket)?;
            let store = connect(&settings).await?;
            let mut objects = std::pin::pin!(BucketCatalog::new(&store).list_objects(&bucket));
            // Stream straight to stdout; a failure still leaves earlier lines printed.
            while let Some(object) = objects
                .try_next()
                .await
                .with_context(|| format!("listing objects in {bucket} failed"))?
            {
                println!("{}\t{}", object.key, object.size);
            }
            Ok(())
        }
        Commands::SetupBucket {
            bucket,
            index_document,
            error_document,
        } => {
            validate_bucket_name(&bucket)?;
            let mut website = settings.website.clone();
            if let Some(index) = index_document {
                website.index_document = index;
            }
            if let Some(error) = error_document {
                website.error_document = error;
            }
            tracing::info!(command = "setup-bucket", bucket = %bucket, ?website, "Starting bucket setup");
            let store = connect(&settings).await?;
            let provisioned = BucketProvisioner::new(&store)
                .provision(&bucket, store.region(), &website)
                .await?;
            println!("{}", EndpointResolver.website_url(&provisioned)?);
            Ok(())
        }
        Commands::Sync {
            path,
            bucket,
            concurrency,
            skip_unchanged,
        } => {
            validate_bucket_name(&bucket)?;
            let mut options = settings.sync.clone();
            if let Some(concurrency) = concurrency {
                options.concurrency = concurrency;
            }
            options.skip_unchanged |= skip_unchanged;
            tracing::info!(command = "sync", path = ?path, bucket = %bucket, ?options, "Starting synchronisation process");
            let store = connect(&settings).await?;
            let target = Bucket::new(bucket, store.region());
            match SyncEngine::new(&store)
                .with_options(options)
                .sync(&path, &target)
                .await
            {
                Ok(report) => {
                    tracing::info!(
                        command = "sync",
                        uploaded = report.uploaded.len(),
                        skipped = report.skipped.len(),
                        "Synchronisation complete"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    Err(e.into())
                }
            }
        }
        Commands::WebsiteUrl { bucket } => {
            let region = match settings.region.clone() {
                Some(region) => region,
                None => connect(&settings).await?.region().to_string(),
            };
            let url = EndpointResolver.website_url(&Bucket::new(bucket, region))?;
            println!("{url}");
            Ok(())
        }
    }
}

async fn connect(settings: &CliConfig) -> Result<S3Store> {
    S3Store::connect(settings.profile.as_deref(), settings.region.as_deref()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_options_are_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "webotron",
            "website-url",
            "my-site",
            "--region",
            "eu-west-1",
            "--profile",
            "deploy",
        ])
        .unwrap();
        assert_eq!(cli.region.as_deref(), Some("eu-west-1"));
        assert_eq!(cli.profile.as_deref(), Some("deploy"));
        assert!(matches!(cli.command, Commands::WebsiteUrl { ref bucket } if bucket == "my-site"));
    }

    #[test]
    fn sync_parses_path_bucket_and_flags() {
        let cli = Cli::try_parse_from([
            "webotron",
            "sync",
            "./public",
            "my-site",
            "--concurrency",
            "3",
            "--skip-unchanged",
        ])
        .unwrap();
        match cli.command {
            Commands::Sync {
                path,
                bucket,
                concurrency,
                skip_unchanged,
            } => {
                assert_eq!(path, PathBuf::from("./public"));
                assert_eq!(bucket, "my-site");
                assert_eq!(concurrency, Some(3));
                assert!(skip_unchanged);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn setup_bucket_documents_are_optional() {
        let cli = Cli::try_parse_from(["webotron", "setup-bucket", "my-site"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::SetupBucket {
                index_document: None,
                error_document: None,
                ..
            }
        ));
    }

    #[test]
    fn sync_requires_a_bucket() {
        assert!(Cli::try_parse_from(["webotron", "sync", "./public"]).is_err());
    }
}
