use crate::core::transport::OpenApiClient;
use crate::domain::auth::Authentication;
use crate::utils::error::Result;

/// Authentication operations.
///
/// Sub-clients authenticate transparently through the shared transport; this
/// client exists for callers that want the token details themselves.
#[derive(Debug, Clone)]
pub struct AuthOps {
    transport: OpenApiClient,
}

impl AuthOps {
    pub fn new(transport: OpenApiClient) -> Self {
        Self { transport }
    }

    /// Logs in with the credentials from the client configuration.
    pub async fn login(&self) -> Result<Authentication> {
        self.transport.login().await
    }

    /// Logs in with explicit credentials, replacing the cached token.
    pub async fn login_with(&self, username: &str, password: &str) -> Result<Authentication> {
        self.transport.login_with(username, password).await
    }
}
