use crate::core::transport::{OpenApiClient, OpenApiRequest};
use crate::domain::model::ApiEnvelope;
use crate::domain::namespace::Namespace;
use crate::utils::error::{NacosError, Result};
use crate::utils::validation::validate_non_empty_string;

const NAMESPACE_ENDPOINT: &str = "/v1/console/namespaces";

/// Namespace administration through the console API.
#[derive(Debug, Clone)]
pub struct NamespaceOps {
    transport: OpenApiClient,
}

impl NamespaceOps {
    pub fn new(transport: OpenApiClient) -> Self {
        Self { transport }
    }

    /// Lists all namespaces. The console wraps the list in an envelope with
    /// code 200 on success.
    pub async fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        let request = OpenApiRequest::get(NAMESPACE_ENDPOINT);
        let envelope: ApiEnvelope<Vec<Namespace>> = self.transport.fetch_json(&request).await?;
        if envelope.code != 200 {
            return Err(NacosError::Api {
                status: 200,
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("console returned code {}", envelope.code)),
            });
        }
        Ok(envelope.data)
    }

    /// Fetches one namespace by id.
    pub async fn get_namespace(&self, namespace_id: &str) -> Result<Option<Namespace>> {
        let request = OpenApiRequest::get(NAMESPACE_ENDPOINT)
            .param("show", "all")
            .param("namespaceId", namespace_id);
        self.transport.fetch_optional_json(&request).await
    }

    /// Creates a namespace. The id must be unique across the cluster.
    pub async fn create_namespace(
        &self,
        namespace_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<bool> {
        validate_non_empty_string("namespace_id", namespace_id)?;
        validate_non_empty_string("name", name)?;

        let request = OpenApiRequest::post(NAMESPACE_ENDPOINT)
            .param("customNamespaceId", namespace_id)
            .param("namespaceName", name)
            .param("namespaceDesc", description.unwrap_or(""));
        self.transport.execute_ok(&request).await
    }

    /// Updates the display name and description of a namespace.
    pub async fn update_namespace(
        &self,
        namespace_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<bool> {
        validate_non_empty_string("namespace_id", namespace_id)?;
        validate_non_empty_string("name", name)?;

        let request = OpenApiRequest::put(NAMESPACE_ENDPOINT)
            .param("namespace", namespace_id)
            .param("namespaceShowName", name)
            .param("namespaceDesc", description.unwrap_or(""));
        self.transport.execute_ok(&request).await
    }

    /// Deletes a namespace along with its configuration items.
    pub async fn delete_namespace(&self, namespace_id: &str) -> Result<bool> {
        validate_non_empty_string("namespace_id", namespace_id)?;

        let request =
            OpenApiRequest::delete(NAMESPACE_ENDPOINT).param("namespaceId", namespace_id);
        self.transport.execute_ok(&request).await
    }
}
