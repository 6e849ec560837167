use serde::Deserialize;

/// Runtime metrics reported by `GET /v1/ns/operator/metrics`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMetrics {
    #[serde(default)]
    pub status: Option<String>,
    pub service_count: u64,
    pub instance_count: u64,
    #[serde(default)]
    pub subscribe_count: Option<u64>,
    #[serde(default)]
    pub responsible_service_count: Option<u64>,
    #[serde(default)]
    pub responsible_instance_count: Option<u64>,
    #[serde(default)]
    pub client_count: Option<u64>,
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub load: Option<f64>,
    #[serde(default)]
    pub mem: Option<f64>,
}

/// One member of the server cluster.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NacosServer {
    pub ip: String,
    #[serde(default)]
    pub serve_port: Option<u16>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub alive: Option<bool>,
    #[serde(default)]
    pub last_ref_time: Option<i64>,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerList {
    #[serde(default)]
    pub servers: Vec<NacosServer>,
}

/// Detail of one connected client (v2 registry).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetail {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub ephemeral: Option<bool>,
    #[serde(default)]
    pub last_updated_time: Option<i64>,
    #[serde(default)]
    pub client_type: Option<String>,
    #[serde(default)]
    pub connect_type: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub client_ip: Option<String>,
    #[serde(default)]
    pub client_port: Option<String>,
}

/// Instance coordinates embedded in client registry entries.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInstanceRef {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub cluster: Option<String>,
}

/// A service registration published by a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPublishedService {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub registered_instance: Option<ClientInstanceRef>,
}

/// A service subscription held by a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSubscribedService {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub subscriber_instance: Option<ClientInstanceRef>,
}

/// A client attached to a service (publisher or subscriber side).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub client_id: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}
