use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::NamedTempFile;

fn webotron() -> Command {
    let mut cmd = Command::cargo_bin("webotron").expect("Binary exists");
    // Keep the developer's AWS environment out of the picture.
    cmd.env_remove("AWS_PROFILE")
        .env_remove("AWS_REGION")
        .env_remove("AWS_DEFAULT_REGION");
    cmd
}

#[test]
fn website_url_prints_the_regional_endpoint_without_network() {
    webotron()
        .args(["website-url", "my-site", "--region", "us-east-1"])
        .assert()
        .success()
        .stdout("http://my-site.s3-website-us-east-1.amazonaws.com\n");
}

#[test]
fn website_url_takes_the_region_from_the_config_file() {
    let config = NamedTempFile::new().expect("temp config");
    write(config.path(), "region: eu-central-1\n").unwrap();

    webotron()
        .arg("--config")
        .arg(config.path())
        .args(["website-url", "my-site"])
        .assert()
        .success()
        .stdout("http://my-site.s3-website.eu-central-1.amazonaws.com\n");
}

#[test]
fn region_flag_overrides_the_config_file() {
    let config = NamedTempFile::new().expect("temp config");
    write(config.path(), "region: eu-central-1\n").unwrap();

    webotron()
        .arg("--config")
        .arg(config.path())
        .args(["website-url", "my-site", "--region", "sa-east-1"])
        .assert()
        .success()
        .stdout("http://my-site.s3-website-sa-east-1.amazonaws.com\n");
}

#[test]
fn invalid_bucket_names_fail_before_any_request() {
    for args in [
        vec!["website-url", "Not_A_Bucket", "--region", "us-east-1"],
        vec!["setup-bucket", "Not_A_Bucket", "--region", "us-east-1"],
        vec!["sync", ".", "ab", "--region", "us-east-1"],
    ] {
        webotron()
            .args(&args)
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("invalid bucket"));
    }
}

#[test]
fn malformed_config_file_is_reported() {
    let config = NamedTempFile::new().expect("temp config");
    write(config.path(), "sync: [not, a, map]\n").unwrap();

    webotron()
        .arg("--config")
        .arg(config.path())
        .args(["website-url", "my-site", "--region", "us-east-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config YAML"));
}

#[test]
fn help_lists_every_command() {
    webotron().arg("--help").assert().success().stdout(
        predicate::str::contains("list-buckets")
            .and(predicate::str::contains("list-bucket-objects"))
            .and(predicate::str::contains("setup-bucket"))
            .and(predicate::str::contains("sync"))
            .and(predicate::str::contains("website-url")),
    );
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use webotron::cli::{run, Cli, Commands};

    let cli = Cli {
        profile: None,
        region: Some("us-east-1".into()),
        config: None,
        command: Commands::WebsiteUrl {
            bucket: "my-site".into(),
        },
    };

    run(cli).await.expect("website-url needs no network");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
