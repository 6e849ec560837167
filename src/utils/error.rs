use thiserror::Error;

#[derive(Error, Debug)]
pub enum NacosError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Nacos server returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Unexpected response payload: {message}")]
    UnexpectedPayload { message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },
}

impl NacosError {
    pub fn config(message: impl Into<String>) -> Self {
        NacosError::Config {
            message: message.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        NacosError::UnexpectedPayload {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NacosError>;
