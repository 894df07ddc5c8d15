use serial_test::serial;
use std::fs::write;
use tempfile::NamedTempFile;
use webotron::load_config::{load_config, load_optional_config, CliConfig};
use webotron_core::config::{SyncOptions, WebsiteConfig, DEFAULT_CONCURRENCY};

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).unwrap();
    file
}

#[test]
#[serial]
fn test_load_config_full_file() {
    let file = config_file(
        r#"
profile: deploy
region: eu-west-1
website:
  index_document: home.html
  error_document: 404.html
sync:
  concurrency: 2
  skip_unchanged: true
"#,
    );

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.profile.as_deref(), Some("deploy"));
    assert_eq!(config.region.as_deref(), Some("eu-west-1"));
    assert_eq!(
        config.website,
        WebsiteConfig {
            index_document: "home.html".into(),
            error_document: "404.html".into(),
        }
    );
    assert_eq!(
        config.sync,
        SyncOptions {
            concurrency: 2,
            skip_unchanged: true,
        }
    );
}

#[test]
#[serial]
fn test_load_config_partial_sections_fall_back_to_defaults() {
    let file = config_file("website:\n  error_document: oops.html\n");

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.profile, None);
    assert_eq!(config.website.index_document, "index.html");
    assert_eq!(config.website.error_document, "oops.html");
    assert_eq!(config.sync.concurrency, DEFAULT_CONCURRENCY);
    assert!(!config.sync.skip_unchanged);
}

#[test]
#[serial]
fn test_load_config_empty_file_is_all_defaults() {
    let file = config_file("   \n");
    assert_eq!(load_config(file.path()).unwrap(), CliConfig::default());
}

#[test]
#[serial]
fn test_load_config_missing_file_fails() {
    let err = load_config("/definitely/not/here/webotron.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"), "{err}");
}

#[test]
#[serial]
fn test_load_config_rejects_unknown_keys() {
    let file = config_file("bucket: my-site\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config YAML"), "{err}");
}

#[test]
fn test_no_config_path_means_defaults() {
    assert_eq!(load_optional_config(None).unwrap(), CliConfig::default());
}

#[test]
fn test_flags_override_file_values() {
    let from_file = CliConfig {
        profile: Some("file-profile".into()),
        region: Some("eu-west-1".into()),
        ..CliConfig::default()
    };

    let merged = from_file.with_overrides(None, Some("ap-south-1".into()));

    assert_eq!(merged.profile.as_deref(), Some("file-profile"));
    assert_eq!(merged.region.as_deref(), Some("ap-south-1"));
}
