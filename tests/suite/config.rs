//! Configuration feeding the connector

use std::fs;

use sage_config::{ConfigError, SageConfig, SERVER_URL_ENV};
use sage_connector::{Endpoint, IntelligenceClient};
use sage_types::AnalysisDepth;

use crate::common::FakeBackend;

#[test]
fn configured_address_parses_as_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[connector]\nserver_url = \"tcp://${SAGE_TEST_HOST}:6100\"\n\n[analysis]\ndepth = \"deep\"\n",
    )
    .unwrap();

    let config = SageConfig::load_from(&path)
        .unwrap()
        .resolve(|name| (name == "SAGE_TEST_HOST").then(|| "10.9.8.7".to_string()));

    let endpoint = Endpoint::parse(&config.connector.server_url).unwrap();
    assert_eq!(endpoint.host(), "10.9.8.7");
    assert_eq!(endpoint.port(), 6100);
    assert_eq!(config.analysis.depth, AnalysisDepth::Deep);
}

#[test]
fn default_config_points_at_default_endpoint() {
    let config = SageConfig::default();
    assert_eq!(
        Endpoint::parse(&config.connector.server_url).unwrap(),
        Endpoint::default()
    );
}

#[test]
fn malformed_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[notifications]\nenabled = \"sometimes\"\n").unwrap();

    let err = SageConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[tokio::test]
async fn env_override_reaches_backend() {
    let backend = FakeBackend::healthy().await;
    let url = backend.url();
    let config = SageConfig::default()
        .resolve(|name| (name == SERVER_URL_ENV).then(|| url.clone()));

    let client = IntelligenceClient::new(
        Endpoint::parse(&config.connector.server_url).unwrap(),
    );
    client.connect().await.unwrap();

    assert_eq!(backend.commands(), vec!["health_check"]);
}
