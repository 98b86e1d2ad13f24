use std::io::Write;

use serial_test::serial;
use tempfile::NamedTempFile;

use crate::config::proc_loader::{file_to_config, parse_config};
use crate::config::settings::LogFormat;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
#[serial]
async fn loads_credentials_from_environment() {
    std::env::set_var("IAM_TEST_CLIENT_ID", "c-from-env");
    std::env::set_var("IAM_TEST_CLIENT_SECRET", "s-from-env");
    std::env::remove_var("IAM_TEST_VERSION");

    let file = write_config(
        r#"
credentials:
  iam_service_url: "https://iam.example/api"
  tenant_id: "t1"
  client_id: "${IAM_TEST_CLIENT_ID}"
  client_secret: "${IAM_TEST_CLIENT_SECRET}"
  iam_version: "${IAM_TEST_VERSION:glp}"
  api_vended_service_client: false
settings:
  guard_window_seconds: 120
  retry:
    attempts: 5
    delay_ms: 250
"#,
    );

    let config = file_to_config(file.path()).await.unwrap();
    assert_eq!(config.credentials.client_id, "c-from-env");
    assert_eq!(config.credentials.client_secret, "s-from-env");
    assert_eq!(config.credentials.iam_version, "glp");
    assert!(!config.credentials.api_vended_service_client);
    assert_eq!(config.settings.guard_window().as_secs(), 120);
    assert_eq!(config.settings.retry.attempts(), 5);
    assert_eq!(config.settings.retry.delay().as_millis(), 250);

    // logging falls back to compact info when the file has none
    let logging = config.settings.logging.unwrap();
    assert_eq!(logging.level, "info");
    assert_eq!(logging.format, LogFormat::Compact);

    std::env::remove_var("IAM_TEST_CLIENT_ID");
    std::env::remove_var("IAM_TEST_CLIENT_SECRET");
}

#[tokio::test]
async fn minimal_config_uses_defaults() {
    let config = parse_config(
        r#"
credentials:
  iam_service_url: "https://iam.example/api"
  client_id: "c1"
  client_secret: "s1"
"#
        .to_owned(),
    )
    .await
    .unwrap();

    assert_eq!(config.credentials.iam_version, "glcs");
    assert!(config.credentials.api_vended_service_client);
    assert!(config.credentials.static_token().is_none());
    assert_eq!(config.settings.retry.attempts(), 3);
    assert!(!config.settings.metrics.is_enabled);
}

#[tokio::test]
async fn invalid_config_reports_every_problem() {
    let err = parse_config(
        r#"
credentials:
  iam_service_url: "ftp://iam.example"
  iam_version: "v9"
  api_vended_service_client: false
settings:
  retry:
    attempts: 0
"#
        .to_owned(),
    )
    .await
    .unwrap_err()
    .to_string();

    assert!(err.contains("config is not valid"), "{}", err);
    assert!(err.contains("v9"), "{}", err);
    assert!(err.contains("tenant_id"), "{}", err);
    assert!(err.contains("client_id"), "{}", err);
}

#[tokio::test]
async fn malformed_yaml_is_rejected() {
    assert!(parse_config("credentials: [unclosed".to_owned()).await.is_err());
}

#[tokio::test]
async fn missing_file_is_reported_with_path() {
    let err = file_to_config(std::path::Path::new("/nonexistent/iam-token.yaml"))
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("/nonexistent/iam-token.yaml"));
}
