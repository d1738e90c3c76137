use super::*;
use std::io::Write;
use yare::parameterized;

#[test]
fn defaults() {
    let config = CoordinatorConfig::default();
    assert!(config.async_allowed);
    assert_eq!(config.max_queued_jobs, None);
    assert_eq!(config.wait_limit, Duration::from_secs(30));
    assert_eq!(config.async_mask(), JobMask::read_only());
}

#[test]
fn empty_document_uses_defaults() {
    let config = CoordinatorConfig::from_toml_str("").unwrap();
    assert_eq!(config, CoordinatorConfig::default());
}

#[test]
fn parses_every_field() {
    let config = CoordinatorConfig::from_toml_str(
        r#"
        async_allowed = false
        max_queued_jobs = 5
        wait_limit = "1500ms"
        async_mask = ["query", "query_unsafe"]
        "#,
    )
    .unwrap();

    assert!(!config.async_allowed);
    assert_eq!(config.max_queued_jobs, Some(5));
    assert_eq!(config.wait_limit, Duration::from_millis(1500));
    assert!(config.async_mask().contains(JobType::QueryUnsafe));
    assert!(!config.async_mask().contains(JobType::Modify));
}

#[parameterized(
    zero = { "0s", None },
    seconds = { "2s", Some(Duration::from_secs(2)) },
    minutes = { "1m", Some(Duration::from_secs(60)) },
)]
fn wait_deadline(limit: &str, expected: Option<Duration>) {
    let config =
        CoordinatorConfig::from_toml_str(&format!("wait_limit = \"{limit}\"")).unwrap();
    assert_eq!(config.wait_deadline(), expected);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = CoordinatorConfig::from_toml_str("max_waiters = 3").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn none_in_async_mask_is_invalid() {
    let err = CoordinatorConfig::from_toml_str(r#"async_mask = ["none"]"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn bad_duration_is_a_parse_error() {
    let err = CoordinatorConfig::from_toml_str(r#"wait_limit = "soon""#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn load_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_queued_jobs = 2").unwrap();
    writeln!(file, "wait_limit = \"250ms\"").unwrap();

    let config = CoordinatorConfig::load(file.path()).unwrap();
    assert_eq!(config.max_queued_jobs, Some(2));
    assert_eq!(config.wait_limit, Duration::from_millis(250));
}

#[test]
fn load_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = CoordinatorConfig::load(&path).unwrap_err();
    assert!(matches!(&err, ConfigError::Io { path: p, .. } if p == &path));
}

#[test]
fn toml_output_parses_back() {
    let config = CoordinatorConfig::new()
        .with_max_queued_jobs(Some(4))
        .with_wait_limit(Duration::from_millis(750))
        .with_async_mask([JobType::Query, JobType::Modify]);

    let text = config.to_toml_string().unwrap();
    assert_eq!(CoordinatorConfig::from_toml_str(&text).unwrap(), config);
}
