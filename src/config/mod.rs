use crate::utils::error::{NacosError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONTEXT_PATH: &str = "/nacos";
pub const DEFAULT_APP_NAME: &str = "nacos-openapi";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LONG_POLL_TIMEOUT_SECS: u64 = 30;

/// Connection settings for a Nacos server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub auth: Option<AuthConfig>,
    pub http: Option<HttpConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the server, e.g. `http://127.0.0.1:8848`.
    pub address: String,
    /// Path prefix the server is mounted under. Defaults to `/nacos`.
    pub context_path: Option<String>,
    pub app_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub long_poll_timeout_secs: Option<u64>,
}

impl ClientConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            server: ServerConfig {
                address: address.into(),
                context_path: None,
                app_name: None,
            },
            auth: None,
            http: None,
        }
    }

    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        self.server.context_path = Some(context_path.into());
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.server.app_name = Some(app_name.into());
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = Some(AuthConfig {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(NacosError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let config: ClientConfig =
            toml::from_str(&processed_content).map_err(|e| NacosError::Validation {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces `${VAR_NAME}` occurrences with the matching environment
    /// variable. Unset variables are left as-is so validation can flag them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn server_address(&self) -> &str {
        &self.server.address
    }

    pub fn context_path(&self) -> &str {
        self.server
            .context_path
            .as_deref()
            .unwrap_or(DEFAULT_CONTEXT_PATH)
    }

    pub fn app_name(&self) -> &str {
        self.server.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }

    pub fn username(&self) -> Option<&str> {
        self.auth.as_ref().map(|a| a.username.as_str())
    }

    pub fn password(&self) -> Option<&str> {
        self.auth.as_ref().map(|a| a.password.as_str())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.http
                .as_ref()
                .and_then(|h| h.connect_timeout_secs)
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.http
                .as_ref()
                .and_then(|h| h.request_timeout_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn long_poll_timeout(&self) -> Duration {
        Duration::from_secs(
            self.http
                .as_ref()
                .and_then(|h| h.long_poll_timeout_secs)
                .unwrap_or(DEFAULT_LONG_POLL_TIMEOUT_SECS),
        )
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_server_address("server.address", &self.server.address)?;

        if let Some(auth) = &self.auth {
            validation::validate_non_empty_string("auth.username", &auth.username)?;
            validation::validate_non_empty_string("auth.password", &auth.password)?;
        }

        if let Some(http) = &self.http {
            if let Some(connect) = http.connect_timeout_secs {
                validation::validate_positive_number("http.connect_timeout_secs", connect, 1)?;
            }
            if let Some(request) = http.request_timeout_secs {
                validation::validate_positive_number("http.request_timeout_secs", request, 1)?;
            }
            if let Some(long_poll) = http.long_poll_timeout_secs {
                validation::validate_positive_number("http.long_poll_timeout_secs", long_poll, 1)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_str_minimal() {
        let config = ClientConfig::from_toml_str(
            r#"
[server]
address = "http://127.0.0.1:8848"
"#,
        )
        .unwrap();

        assert_eq!(config.server_address(), "http://127.0.0.1:8848");
        assert_eq!(config.context_path(), "/nacos");
        assert_eq!(config.app_name(), "nacos-openapi");
        assert_eq!(config.long_poll_timeout(), Duration::from_secs(30));
        assert!(config.username().is_none());
    }

    #[test]
    fn test_from_toml_str_full() {
        let config = ClientConfig::from_toml_str(
            r#"
[server]
address = "https://nacos.internal:8848"
context_path = ""
app_name = "orders-service"

[auth]
username = "nacos"
password = "nacos"

[http]
connect_timeout_secs = 5
request_timeout_secs = 20
long_poll_timeout_secs = 45
"#,
        )
        .unwrap();

        assert_eq!(config.context_path(), "");
        assert_eq!(config.app_name(), "orders-service");
        assert_eq!(config.username(), Some("nacos"));
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(20));
        assert_eq!(config.long_poll_timeout(), Duration::from_secs(45));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("NACOS_TEST_ADDRESS", "http://10.0.0.1:8848");

        let config = ClientConfig::from_toml_str(
            r#"
[server]
address = "${NACOS_TEST_ADDRESS}"
"#,
        )
        .unwrap();

        assert_eq!(config.server_address(), "http://10.0.0.1:8848");
        std::env::remove_var("NACOS_TEST_ADDRESS");
    }

    #[test]
    fn test_invalid_server_address_rejected() {
        let result = ClientConfig::from_toml_str(
            r#"
[server]
address = "not a url"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let result = ClientConfig::from_toml_str(
            r#"
[server]
address = "http://127.0.0.1:8848"

[auth]
username = ""
password = "nacos"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_with_credentials() {
        let config = ClientConfig::new("http://127.0.0.1:8848")
            .with_context_path("")
            .with_credentials("nacos", "nacos");

        assert!(config.validate().is_ok());
        assert_eq!(config.username(), Some("nacos"));
        assert_eq!(config.context_path(), "");
    }
}
