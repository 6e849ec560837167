use serde::Deserialize;

/// Result of a successful login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authentication {
    pub access_token: String,
    /// Token lifetime in seconds.
    pub token_ttl: u64,
    #[serde(default)]
    pub global_admin: bool,
}
