use anyhow::Result;
use nacos_openapi::{ClientConfig, NacosClient};
use tempfile::TempDir;

#[tokio::test]
async fn test_client_from_config_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("nacos.toml");

    std::fs::write(
        &config_path,
        r#"
[server]
address = "http://127.0.0.1:8848"
app_name = "orders-service"

[auth]
username = "nacos"
password = "${NACOS_PASSWORD_FROM_FILE_TEST}"

[http]
long_poll_timeout_secs = 45
"#,
    )?;

    std::env::set_var("NACOS_PASSWORD_FROM_FILE_TEST", "s3cret");
    let config = ClientConfig::from_file(&config_path)?;
    std::env::remove_var("NACOS_PASSWORD_FROM_FILE_TEST");

    assert_eq!(config.app_name(), "orders-service");
    assert_eq!(config.password(), Some("s3cret"));
    assert_eq!(config.long_poll_timeout().as_secs(), 45);

    let client = NacosClient::new(config)?;
    assert_eq!(client.config().context_path(), "/nacos");
    Ok(())
}

#[tokio::test]
async fn test_missing_config_file_is_io_error() {
    let result = ClientConfig::from_file("/nonexistent/nacos.toml");
    assert!(matches!(
        result.unwrap_err(),
        nacos_openapi::NacosError::Io(_)
    ));
}
