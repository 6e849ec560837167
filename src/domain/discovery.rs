use crate::domain::model::{
    DEFAULT_CLUSTER_NAME, DEFAULT_GROUP_NAME, DEFAULT_NAMESPACE_ID, GROUP_SERVICE_NAME_SEPARATOR,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Consistency mode of registered instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsistencyType {
    #[default]
    Ephemeral,
    Persist,
}

impl ConsistencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsistencyType::Ephemeral => "ephemeral",
            ConsistencyType::Persist => "persist",
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self, ConsistencyType::Ephemeral)
    }
}

/// A service instance as reported by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(default)]
    pub instance_id: Option<String>,
    pub ip: String,
    pub port: u16,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_true")]
    pub healthy: bool,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub ephemeral: Option<bool>,
    #[serde(default)]
    pub marked: Option<bool>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn default_weight() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Registration parameters for one instance.
#[derive(Debug, Clone)]
pub struct NewInstance {
    pub namespace_id: String,
    pub group_name: String,
    pub cluster_name: String,
    pub service_name: String,
    pub ip: String,
    pub port: u16,
    pub weight: Option<f64>,
    pub enabled: Option<bool>,
    pub healthy: Option<bool>,
    pub ephemeral: Option<bool>,
    pub metadata: HashMap<String, String>,
}

impl NewInstance {
    pub fn new(service_name: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        Self {
            namespace_id: DEFAULT_NAMESPACE_ID.to_string(),
            group_name: DEFAULT_GROUP_NAME.to_string(),
            cluster_name: DEFAULT_CLUSTER_NAME.to_string(),
            service_name: service_name.into(),
            ip: ip.into(),
            port,
            weight: None,
            enabled: None,
            healthy: None,
            ephemeral: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_namespace(mut self, namespace_id: impl Into<String>) -> Self {
        self.namespace_id = namespace_id.into();
        self
    }

    pub fn with_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = group_name.into();
        self
    }

    pub fn with_cluster(mut self, cluster_name: impl Into<String>) -> Self {
        self.cluster_name = cluster_name.into();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = Some(ephemeral);
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Coordinates addressing a single registered instance.
#[derive(Debug, Clone)]
pub struct InstanceKey {
    pub namespace_id: String,
    pub group_name: String,
    pub cluster_name: String,
    pub service_name: String,
    pub ip: String,
    pub port: u16,
    pub ephemeral: Option<bool>,
}

impl InstanceKey {
    pub fn new(service_name: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        Self {
            namespace_id: DEFAULT_NAMESPACE_ID.to_string(),
            group_name: DEFAULT_GROUP_NAME.to_string(),
            cluster_name: DEFAULT_CLUSTER_NAME.to_string(),
            service_name: service_name.into(),
            ip: ip.into(),
            port,
            ephemeral: None,
        }
    }

    pub fn with_namespace(mut self, namespace_id: impl Into<String>) -> Self {
        self.namespace_id = namespace_id.into();
        self
    }

    pub fn with_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = group_name.into();
        self
    }

    pub fn with_cluster(mut self, cluster_name: impl Into<String>) -> Self {
        self.cluster_name = cluster_name.into();
        self
    }

    pub fn with_ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = Some(ephemeral);
        self
    }
}

/// Filters for listing the instances of a service.
#[derive(Debug, Clone)]
pub struct InstanceListQuery {
    pub namespace_id: String,
    pub group_name: String,
    pub service_name: String,
    pub clusters: Option<String>,
    pub healthy_only: bool,
    pub app: Option<String>,
}

impl InstanceListQuery {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            namespace_id: DEFAULT_NAMESPACE_ID.to_string(),
            group_name: DEFAULT_GROUP_NAME.to_string(),
            service_name: service_name.into(),
            clusters: None,
            healthy_only: false,
            app: None,
        }
    }

    pub fn with_namespace(mut self, namespace_id: impl Into<String>) -> Self {
        self.namespace_id = namespace_id.into();
        self
    }

    pub fn with_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = group_name.into();
        self
    }

    pub fn with_clusters(mut self, clusters: impl Into<String>) -> Self {
        self.clusters = Some(clusters.into());
        self
    }

    pub fn healthy_only(mut self) -> Self {
        self.healthy_only = true;
        self
    }
}

/// The instance list for one service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceList {
    /// Composed name, `<group>@@<service>`.
    pub name: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub clusters: Option<String>,
    #[serde(default)]
    pub cache_millis: Option<u64>,
    #[serde(default)]
    pub hosts: Vec<Instance>,
    #[serde(default)]
    pub last_ref_time: Option<i64>,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(rename = "allIPs", default)]
    pub all_ips: Option<bool>,
    #[serde(default)]
    pub reach_protection_threshold: Option<bool>,
    #[serde(default)]
    pub valid: Option<bool>,
}

impl InstanceList {
    pub fn service_name(&self) -> &str {
        match self.name.split_once(GROUP_SERVICE_NAME_SEPARATOR) {
            Some((_, service)) => service,
            None => &self.name,
        }
    }

    pub fn group_name(&self) -> &str {
        match self.group_name.as_deref() {
            Some(group) => group,
            None => self
                .name
                .split_once(GROUP_SERVICE_NAME_SEPARATOR)
                .map(|(group, _)| group)
                .unwrap_or(DEFAULT_GROUP_NAME),
        }
    }
}

/// A batch metadata change applied to several instances of one service.
#[derive(Debug, Clone)]
pub struct BatchMetadata {
    pub namespace_id: String,
    pub group_name: String,
    pub service_name: String,
    pub instances: Vec<InstanceKey>,
    pub metadata: HashMap<String, String>,
    pub consistency: ConsistencyType,
}

impl BatchMetadata {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            namespace_id: DEFAULT_NAMESPACE_ID.to_string(),
            group_name: DEFAULT_GROUP_NAME.to_string(),
            service_name: service_name.into(),
            instances: Vec::new(),
            metadata: HashMap::new(),
            consistency: ConsistencyType::default(),
        }
    }

    pub fn with_namespace(mut self, namespace_id: impl Into<String>) -> Self {
        self.namespace_id = namespace_id.into();
        self
    }

    pub fn with_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = group_name.into();
        self
    }

    pub fn with_instance(mut self, key: InstanceKey) -> Self {
        self.instances.push(key);
        self
    }

    pub fn with_metadata_entry(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_consistency(mut self, consistency: ConsistencyType) -> Self {
        self.consistency = consistency;
        self
    }
}

/// A service definition for create/update calls.
#[derive(Debug, Clone)]
pub struct Service {
    pub namespace_id: String,
    pub group_name: String,
    pub name: String,
    pub protect_threshold: Option<f64>,
    pub metadata: HashMap<String, String>,
    pub selector: Option<serde_json::Value>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace_id: DEFAULT_NAMESPACE_ID.to_string(),
            group_name: DEFAULT_GROUP_NAME.to_string(),
            name: name.into(),
            protect_threshold: None,
            metadata: HashMap::new(),
            selector: None,
        }
    }

    pub fn with_namespace(mut self, namespace_id: impl Into<String>) -> Self {
        self.namespace_id = namespace_id.into();
        self
    }

    pub fn with_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = group_name.into();
        self
    }

    pub fn with_protect_threshold(mut self, threshold: f64) -> Self {
        self.protect_threshold = Some(threshold);
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A service as returned by `GET /v1/ns/service`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetail {
    pub name: String,
    #[serde(default)]
    pub namespace_id: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub protect_threshold: Option<f64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub selector: Option<serde_json::Value>,
    #[serde(default)]
    pub clusters: Vec<serde_json::Value>,
}

/// Heartbeat acknowledgement.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    pub client_beat_interval: u64,
    pub code: i32,
    #[serde(default)]
    pub light_beat_enabled: Option<bool>,
}

/// Result of a batch metadata update or delete.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchMetadataResult {
    #[serde(default)]
    pub updated: Vec<String>,
}
