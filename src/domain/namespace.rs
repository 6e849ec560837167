use serde::Deserialize;

/// A namespace (tenant) on the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    /// Namespace id; empty string for the reserved public namespace.
    pub namespace: String,
    pub namespace_show_name: String,
    #[serde(default)]
    pub namespace_desc: Option<String>,
    #[serde(default)]
    pub quota: Option<u32>,
    #[serde(default)]
    pub config_count: Option<u32>,
    #[serde(rename = "type", default)]
    pub namespace_type: Option<u8>,
}
