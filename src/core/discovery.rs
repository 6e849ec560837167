use crate::core::transport::{OpenApiClient, OpenApiRequest};
use crate::domain::discovery::{
    BatchMetadata, BatchMetadataResult, Heartbeat, Instance, InstanceKey, InstanceList,
    InstanceListQuery, NewInstance, Service, ServiceDetail,
};
use crate::domain::model::{Page, GROUP_SERVICE_NAME_SEPARATOR, MAX_PAGE_SIZE};
use crate::utils::error::Result;
use crate::utils::validation::validate_range;
use serde::Deserialize;
use std::collections::HashMap;

const INSTANCE_ENDPOINT: &str = "/v1/ns/instance";
const INSTANCE_LIST_ENDPOINT: &str = "/v1/ns/instance/list";
const INSTANCE_BEAT_ENDPOINT: &str = "/v1/ns/instance/beat";
const INSTANCE_HEALTH_ENDPOINT: &str = "/v1/ns/health/instance";
const INSTANCE_METADATA_BATCH_ENDPOINT: &str = "/v1/ns/instance/metadata/batch";
const SERVICE_ENDPOINT: &str = "/v1/ns/service";
const SERVICE_LIST_ENDPOINT: &str = "/v1/ns/service/list";

fn grouped_service_name(group_name: &str, service_name: &str) -> String {
    format!("{group_name}{GROUP_SERVICE_NAME_SEPARATOR}{service_name}")
}

fn metadata_json(metadata: &HashMap<String, String>) -> Option<String> {
    if metadata.is_empty() {
        None
    } else {
        serde_json::to_string(metadata).ok()
    }
}

/// Service instance operations of the naming module.
#[derive(Debug, Clone)]
pub struct InstanceOps {
    transport: OpenApiClient,
}

impl InstanceOps {
    pub fn new(transport: OpenApiClient) -> Self {
        Self { transport }
    }

    /// Registers an instance under its service.
    pub async fn register(&self, instance: &NewInstance) -> Result<bool> {
        let request = self.instance_params(OpenApiRequest::post(INSTANCE_ENDPOINT), instance);
        self.transport.execute_ok(&request).await
    }

    /// Updates the registration of an existing instance.
    pub async fn update(&self, instance: &NewInstance) -> Result<bool> {
        let request = self.instance_params(OpenApiRequest::put(INSTANCE_ENDPOINT), instance);
        self.transport.execute_ok(&request).await
    }

    fn instance_params(&self, request: OpenApiRequest, instance: &NewInstance) -> OpenApiRequest {
        request
            .param("namespaceId", &instance.namespace_id)
            .param("serviceName", &instance.service_name)
            .param("groupName", &instance.group_name)
            .param("clusterName", &instance.cluster_name)
            .param("ip", &instance.ip)
            .param("port", instance.port)
            .opt_param("weight", instance.weight)
            .opt_param("enabled", instance.enabled)
            .opt_param("healthy", instance.healthy)
            .opt_param("ephemeral", instance.ephemeral)
            .opt_param("metadata", metadata_json(&instance.metadata))
    }

    /// Removes an instance from its service.
    pub async fn deregister(&self, key: &InstanceKey) -> Result<bool> {
        let request = OpenApiRequest::delete(INSTANCE_ENDPOINT)
            .param("namespaceId", &key.namespace_id)
            .param("serviceName", &key.service_name)
            .param("groupName", &key.group_name)
            .param("clusterName", &key.cluster_name)
            .param("ip", &key.ip)
            .param("port", key.port)
            .opt_param("ephemeral", key.ephemeral);
        self.transport.execute_ok(&request).await
    }

    /// Fetches the detail of one registered instance.
    pub async fn get_instance(&self, key: &InstanceKey) -> Result<Option<Instance>> {
        let request = OpenApiRequest::get(INSTANCE_ENDPOINT)
            .param("namespaceId", &key.namespace_id)
            .param("serviceName", &key.service_name)
            .param("groupName", &key.group_name)
            .param("cluster", &key.cluster_name)
            .param("ip", &key.ip)
            .param("port", key.port);
        self.transport.fetch_optional_json(&request).await
    }

    /// Lists the instances of a service.
    pub async fn list_instances(&self, query: &InstanceListQuery) -> Result<InstanceList> {
        let request = OpenApiRequest::get(INSTANCE_LIST_ENDPOINT)
            .param("namespaceId", &query.namespace_id)
            .param("serviceName", &query.service_name)
            .param("groupName", &query.group_name)
            .param("healthyOnly", query.healthy_only)
            .opt_param("clusters", query.clusters.as_deref())
            .opt_param("app", query.app.as_deref());
        self.transport.fetch_json(&request).await
    }

    /// Sends a client beat for an ephemeral instance. The acknowledgement
    /// carries the interval the server expects between beats.
    pub async fn send_heartbeat(&self, instance: &NewInstance) -> Result<Heartbeat> {
        let beat = serde_json::json!({
            "serviceName": grouped_service_name(&instance.group_name, &instance.service_name),
            "cluster": instance.cluster_name,
            "ip": instance.ip,
            "port": instance.port,
            "weight": instance.weight.unwrap_or(1.0),
            "metadata": instance.metadata,
        });

        let request = OpenApiRequest::put(INSTANCE_BEAT_ENDPOINT)
            .param("namespaceId", &instance.namespace_id)
            .param(
                "serviceName",
                grouped_service_name(&instance.group_name, &instance.service_name),
            )
            .param("groupName", &instance.group_name)
            .param("clusterName", &instance.cluster_name)
            .param("ip", &instance.ip)
            .param("port", instance.port)
            .param("beat", beat.to_string());
        self.transport.fetch_json(&request).await
    }

    /// Forces the health flag of an instance. Only honored by services whose
    /// cluster uses the `none` health checker.
    pub async fn update_health(&self, key: &InstanceKey, healthy: bool) -> Result<bool> {
        let request = OpenApiRequest::put(INSTANCE_HEALTH_ENDPOINT)
            .param("namespaceId", &key.namespace_id)
            .param("serviceName", &key.service_name)
            .param("groupName", &key.group_name)
            .param("clusterName", &key.cluster_name)
            .param("ip", &key.ip)
            .param("port", key.port)
            .param("healthy", healthy);
        self.transport.execute_ok(&request).await
    }

    /// Merges metadata into every addressed instance.
    pub async fn batch_update_metadata(
        &self,
        batch: &BatchMetadata,
    ) -> Result<BatchMetadataResult> {
        let request = self.batch_params(
            OpenApiRequest::put(INSTANCE_METADATA_BATCH_ENDPOINT),
            batch,
        );
        self.transport.fetch_json(&request).await
    }

    /// Removes the given metadata keys from every addressed instance.
    pub async fn batch_delete_metadata(
        &self,
        batch: &BatchMetadata,
    ) -> Result<BatchMetadataResult> {
        let request = self.batch_params(
            OpenApiRequest::delete(INSTANCE_METADATA_BATCH_ENDPOINT),
            batch,
        );
        self.transport.fetch_json(&request).await
    }

    fn batch_params(&self, request: OpenApiRequest, batch: &BatchMetadata) -> OpenApiRequest {
        let instances: Vec<serde_json::Value> = batch
            .instances
            .iter()
            .map(|key| {
                serde_json::json!({
                    "ip": key.ip,
                    "port": key.port,
                    "clusterName": key.cluster_name,
                    "ephemeral": key.ephemeral.unwrap_or(batch.consistency.is_ephemeral()),
                })
            })
            .collect();

        request
            .param("namespaceId", &batch.namespace_id)
            .param(
                "serviceName",
                grouped_service_name(&batch.group_name, &batch.service_name),
            )
            .param("consistencyType", batch.consistency.as_str())
            .param(
                "instances",
                serde_json::Value::Array(instances).to_string(),
            )
            .param(
                "metadata",
                serde_json::to_string(&batch.metadata).unwrap_or_else(|_| "{}".to_string()),
            )
    }
}

/// Shape of `GET /v1/ns/service/list` responses.
#[derive(Debug, Deserialize)]
struct ServiceNameList {
    count: u64,
    #[serde(default)]
    doms: Vec<String>,
}

/// Service definition operations of the naming module.
#[derive(Debug, Clone)]
pub struct ServiceOps {
    transport: OpenApiClient,
}

impl ServiceOps {
    pub fn new(transport: OpenApiClient) -> Self {
        Self { transport }
    }

    pub async fn create_service(&self, service: &Service) -> Result<bool> {
        let request = self.service_params(OpenApiRequest::post(SERVICE_ENDPOINT), service);
        self.transport.execute_ok(&request).await
    }

    pub async fn update_service(&self, service: &Service) -> Result<bool> {
        let request = self.service_params(OpenApiRequest::put(SERVICE_ENDPOINT), service);
        self.transport.execute_ok(&request).await
    }

    fn service_params(&self, request: OpenApiRequest, service: &Service) -> OpenApiRequest {
        request
            .param("namespaceId", &service.namespace_id)
            .param("serviceName", &service.name)
            .param("groupName", &service.group_name)
            .opt_param("protectThreshold", service.protect_threshold)
            .opt_param("metadata", metadata_json(&service.metadata))
            .opt_param("selector", service.selector.as_ref().map(|s| s.to_string()))
    }

    /// Deletes a service. The server rejects the call while instances are
    /// still registered.
    pub async fn delete_service(
        &self,
        namespace_id: &str,
        group_name: &str,
        service_name: &str,
    ) -> Result<bool> {
        let request = OpenApiRequest::delete(SERVICE_ENDPOINT)
            .param("namespaceId", namespace_id)
            .param("serviceName", service_name)
            .param("groupName", group_name);
        self.transport.execute_ok(&request).await
    }

    pub async fn get_service(
        &self,
        namespace_id: &str,
        group_name: &str,
        service_name: &str,
    ) -> Result<Option<ServiceDetail>> {
        let request = OpenApiRequest::get(SERVICE_ENDPOINT)
            .param("namespaceId", namespace_id)
            .param("serviceName", service_name)
            .param("groupName", group_name);
        self.transport.fetch_optional_json(&request).await
    }

    /// Pages through the service names of a namespace.
    pub async fn list_service_names(
        &self,
        namespace_id: &str,
        group_name: &str,
        page_number: u32,
        page_size: u32,
    ) -> Result<Page<String>> {
        validate_range("page_number", page_number, 1, u32::MAX)?;
        validate_range("page_size", page_size, 1, MAX_PAGE_SIZE)?;

        let request = OpenApiRequest::get(SERVICE_LIST_ENDPOINT)
            .param("namespaceId", namespace_id)
            .param("groupName", group_name)
            .param("pageNo", page_number)
            .param("pageSize", page_size);
        let list: ServiceNameList = self.transport.fetch_json(&request).await?;
        Ok(Page::from_parts(
            list.count,
            page_number,
            page_size,
            list.doms,
        ))
    }
}
