use crate::core::transport::{OpenApiClient, OpenApiRequest};
use crate::domain::model::ApiEnvelope;
use crate::domain::ops::{
    ClientDetail, ClientInfo, ClientPublishedService, ClientSubscribedService, NacosServer,
    ServerList, ServerMetrics,
};
use crate::utils::error::{NacosError, Result};
use serde::de::DeserializeOwned;

const METRICS_ENDPOINT: &str = "/v1/ns/operator/metrics";
const SERVERS_ENDPOINT: &str = "/v1/ns/operator/servers";

const CLIENT_LIST_ENDPOINT: &str = "/v2/ns/client/list";
const CLIENT_ENDPOINT: &str = "/v2/ns/client";
const CLIENT_PUBLISH_LIST_ENDPOINT: &str = "/v2/ns/client/publish/list";
const CLIENT_SUBSCRIBE_LIST_ENDPOINT: &str = "/v2/ns/client/subscribe/list";
const SERVICE_PUBLISHER_LIST_ENDPOINT: &str = "/v2/ns/client/service/publisher/list";
const SERVICE_SUBSCRIBER_LIST_ENDPOINT: &str = "/v2/ns/client/service/subscriber/list";

/// Cluster operator queries and the v2 client registry.
#[derive(Debug, Clone)]
pub struct OperatorOps {
    transport: OpenApiClient,
}

impl OperatorOps {
    pub fn new(transport: OpenApiClient) -> Self {
        Self { transport }
    }

    /// Fetches the runtime metrics of the serving node.
    pub async fn get_metrics(&self) -> Result<ServerMetrics> {
        let request = OpenApiRequest::get(METRICS_ENDPOINT);
        self.transport.fetch_json(&request).await
    }

    /// Lists the members of the server cluster.
    pub async fn list_servers(&self) -> Result<Vec<NacosServer>> {
        let request = OpenApiRequest::get(SERVERS_ENDPOINT);
        let list: ServerList = self.transport.fetch_json(&request).await?;
        Ok(list.servers)
    }

    /// Lists the ids of all connected clients.
    pub async fn list_client_ids(&self) -> Result<Vec<String>> {
        let request = OpenApiRequest::get(CLIENT_LIST_ENDPOINT);
        self.fetch_v2(&request).await
    }

    /// Fetches detail for one connected client.
    pub async fn get_client(&self, client_id: &str) -> Result<ClientDetail> {
        let request = OpenApiRequest::get(CLIENT_ENDPOINT).param("clientId", client_id);
        self.fetch_v2(&request).await
    }

    /// Lists the services a client has registered instances for.
    pub async fn get_client_published_services(
        &self,
        client_id: &str,
    ) -> Result<Vec<ClientPublishedService>> {
        let request =
            OpenApiRequest::get(CLIENT_PUBLISH_LIST_ENDPOINT).param("clientId", client_id);
        self.fetch_v2(&request).await
    }

    /// Lists the services a client subscribes to.
    pub async fn get_client_subscribed_services(
        &self,
        client_id: &str,
    ) -> Result<Vec<ClientSubscribedService>> {
        let request =
            OpenApiRequest::get(CLIENT_SUBSCRIBE_LIST_ENDPOINT).param("clientId", client_id);
        self.fetch_v2(&request).await
    }

    /// Lists the clients that publish instances of a service.
    pub async fn get_service_publishers(
        &self,
        namespace_id: &str,
        group_name: &str,
        service_name: &str,
    ) -> Result<Vec<ClientInfo>> {
        let request = self.service_client_params(
            OpenApiRequest::get(SERVICE_PUBLISHER_LIST_ENDPOINT),
            namespace_id,
            group_name,
            service_name,
        );
        self.fetch_v2(&request).await
    }

    /// Lists the clients subscribed to a service.
    pub async fn get_service_subscribers(
        &self,
        namespace_id: &str,
        group_name: &str,
        service_name: &str,
    ) -> Result<Vec<ClientInfo>> {
        let request = self.service_client_params(
            OpenApiRequest::get(SERVICE_SUBSCRIBER_LIST_ENDPOINT),
            namespace_id,
            group_name,
            service_name,
        );
        self.fetch_v2(&request).await
    }

    fn service_client_params(
        &self,
        request: OpenApiRequest,
        namespace_id: &str,
        group_name: &str,
        service_name: &str,
    ) -> OpenApiRequest {
        request
            .param("namespaceId", namespace_id)
            .param("groupName", group_name)
            .param("serviceName", service_name)
            .param("ephemeral", true)
    }

    /// v2 responses are wrapped in an envelope carrying code 0 on success.
    async fn fetch_v2<T: DeserializeOwned>(&self, request: &OpenApiRequest) -> Result<T> {
        let envelope: ApiEnvelope<T> = self.transport.fetch_json(request).await?;
        if envelope.code != 0 {
            return Err(NacosError::Api {
                status: 200,
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("server returned code {}", envelope.code)),
            });
        }
        Ok(envelope.data)
    }
}
