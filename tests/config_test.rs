//! Configuration system tests.

use metrics_advisor::core::config::{HttpLogDetailLevel, LogLevel, API_KEY_ENV, ENDPOINT_ENV, SUBSCRIPTION_KEY_ENV};
use metrics_advisor::core::{Config, ConfigBuilder, KeyCredential, ServiceVersion};
use metrics_advisor::client::InMemoryAdministrationClient;
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

fn valid_builder() -> ConfigBuilder {
    ConfigBuilder::new()
        .endpoint("https://contoso.cognitiveservices.azure.com")
        .credential(KeyCredential::new("subscription", "api").unwrap())
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(config.validate().is_err());
    assert_eq!(config.client.service_version, ServiceVersion::V1_0);
    assert_eq!(config.client.timeout, Duration::from_secs(30));
    assert_eq!(config.paging.default_page_size, 20);
    assert_eq!(config.paging.max_page_size, 100);
    assert_eq!(config.logging.level, LogLevel::Info);
}

#[test]
fn test_config_builder() {
    let config = valid_builder()
        .http_log_detail(HttpLogDetailLevel::Headers)
        .timeout(Duration::from_secs(5))
        .default_page_size(10)
        .max_page_size(50)
        .log_level(LogLevel::Warn)
        .debug(true)
        .build()
        .unwrap();

    assert_eq!(config.client.http_log_detail, HttpLogDetailLevel::Headers);
    assert_eq!(config.client.timeout, Duration::from_secs(5));
    assert_eq!(config.paging.default_page_size, 10);
    assert_eq!(config.logging.level, LogLevel::Warn);
    assert!(config.debug);
}

#[test]
fn test_yaml_config_file() {
    let yaml = r#"
client:
  endpoint: https://contoso.cognitiveservices.azure.com
  credential:
    subscription_key: sub-from-file
    api_key: api-from-file
  service_version: v1.0
  http_log_detail: body_and_headers
  timeout: 45s
paging:
  default_page_size: 25
  max_page_size: 200
logging:
  level: debug
  structured: true
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let content = std::fs::read_to_string(file.path()).unwrap();
    let config = ConfigBuilder::new().from_yaml(&content).unwrap().build().unwrap();

    assert_eq!(config.client.credential.subscription_key(), "sub-from-file");
    assert_eq!(config.client.http_log_detail, HttpLogDetailLevel::BodyAndHeaders);
    assert_eq!(config.client.timeout, Duration::from_secs(45));
    assert_eq!(config.paging.max_page_size, 200);
    assert!(config.logging.structured);
}

#[test]
fn test_invalid_yaml() {
    assert!(ConfigBuilder::new().from_yaml("client: [unclosed").is_err());
}

#[test]
fn test_environment_overrides_file() {
    let env: HashMap<&str, &str> = [
        (ENDPOINT_ENV, "https://override.cognitiveservices.azure.com"),
        (SUBSCRIPTION_KEY_ENV, "sub-from-env"),
        (API_KEY_ENV, ""),
    ]
    .into_iter()
    .collect();

    let config = valid_builder()
        .from_lookup(|name| env.get(name).map(|v| v.to_string()))
        .build()
        .unwrap();

    assert_eq!(config.client.endpoint, "https://override.cognitiveservices.azure.com");
    assert_eq!(config.client.credential.subscription_key(), "sub-from-env");
    // empty values do not clear what is already set
    assert_eq!(config.client.credential.api_key(), "api");
}

#[test]
fn test_unvalidated_build_keeps_partial_config() {
    let config = ConfigBuilder::new().default_page_size(5).build_unvalidated();
    assert!(config.validate().is_err());
    assert_eq!(config.paging.default_page_size, 5);
}

#[test]
fn test_client_from_config() {
    let config = valid_builder().build().unwrap();
    assert!(InMemoryAdministrationClient::with_config(&config).is_ok());

    let broken = ConfigBuilder::new().build_unvalidated();
    let err = InMemoryAdministrationClient::with_config(&broken).err().unwrap();
    assert_eq!(err.category(), "config");
}

#[test]
fn test_secrets_never_printed() {
    let config = valid_builder().build().unwrap();
    let debug = format!("{:?}", config);
    assert!(!debug.contains("subscription\""));
    assert!(!debug.contains("\"api\""));
    assert!(debug.contains("<redacted>"));
}
