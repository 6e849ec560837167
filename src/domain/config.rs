use crate::domain::model::{DEFAULT_GROUP_NAME, DEFAULT_NAMESPACE_ID};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// Coordinates identifying one configuration item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigId {
    pub namespace_id: String,
    pub group: String,
    pub data_id: String,
}

impl ConfigId {
    pub fn new(data_id: impl Into<String>) -> Self {
        Self {
            namespace_id: DEFAULT_NAMESPACE_ID.to_string(),
            group: DEFAULT_GROUP_NAME.to_string(),
            data_id: data_id.into(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_namespace(mut self, namespace_id: impl Into<String>) -> Self {
        self.namespace_id = namespace_id.into();
        self
    }
}

/// Content format hints understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    Text,
    Json,
    Xml,
    Yaml,
    Html,
    Properties,
}

impl ConfigType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigType::Text => "text",
            ConfigType::Json => "json",
            ConfigType::Xml => "xml",
            ConfigType::Yaml => "yaml",
            ConfigType::Html => "html",
            ConfigType::Properties => "properties",
        }
    }
}

/// A configuration item as returned by `GET /v1/cs/configs?show=all`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    #[serde(default, deserialize_with = "de_opt_string_or_number")]
    pub id: Option<String>,
    pub data_id: String,
    pub group: String,
    #[serde(default)]
    pub tenant: Option<String>,
    pub content: String,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(rename = "type", default)]
    pub config_type: Option<ConfigType>,
    #[serde(default)]
    pub create_time: Option<i64>,
    #[serde(default)]
    pub modify_time: Option<i64>,
    #[serde(default)]
    pub create_user: Option<String>,
    #[serde(default)]
    pub create_ip: Option<String>,
}

/// A configuration item to publish.
#[derive(Debug, Clone)]
pub struct NewConfig {
    pub id: ConfigId,
    pub content: String,
    pub config_type: Option<ConfigType>,
    pub tag: Option<String>,
    pub app_name: Option<String>,
}

impl NewConfig {
    pub fn new(id: ConfigId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            config_type: None,
            tag: None,
            app_name: None,
        }
    }

    pub fn with_type(mut self, config_type: ConfigType) -> Self {
        self.config_type = Some(config_type);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }
}

/// Operation recorded in a configuration history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOperation {
    Insert,
    Update,
    Delete,
}

impl ConfigOperation {
    /// The server pads `opType` with trailing whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "I" => Some(ConfigOperation::Insert),
            "U" => Some(ConfigOperation::Update),
            "D" => Some(ConfigOperation::Delete),
            _ => None,
        }
    }
}

/// One revision from the configuration history.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    #[serde(rename = "id", deserialize_with = "de_revision")]
    pub revision: u64,
    #[serde(rename = "lastId", default)]
    pub last_revision: Option<i64>,
    pub data_id: String,
    pub group: String,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "srcIp", default)]
    pub operator_ip: Option<String>,
    #[serde(rename = "srcUser", default)]
    pub operator: Option<String>,
    #[serde(rename = "opType", default, deserialize_with = "de_operation")]
    pub operation: Option<ConfigOperation>,
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub created_time: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub last_modified_time: Option<DateTime<FixedOffset>>,
}

fn de_revision<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        Number(u64),
        String(String),
    }

    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Number(n) => Ok(n),
        StringOrNumber::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn de_opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        Number(i64),
        String(String),
    }

    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
        StringOrNumber::Number(n) => n.to_string(),
        StringOrNumber::String(s) => s,
    }))
}

fn de_operation<'de, D>(deserializer: D) -> Result<Option<ConfigOperation>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .as_deref()
        .and_then(ConfigOperation::parse))
}

fn de_opt_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
