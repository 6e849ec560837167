use crate::config::ClientConfig;
use crate::core::auth::AuthOps;
use crate::core::config::ConfigOps;
use crate::core::discovery::{InstanceOps, ServiceOps};
use crate::core::namespace::NamespaceOps;
use crate::core::ops::OperatorOps;
use crate::core::transport::OpenApiClient;
use crate::utils::error::Result;
use crate::utils::validation::Validate;

/// Entry point composing all Open API sub-clients over one shared transport.
///
/// Cloning is cheap; clones share the HTTP connection pool, the cached access
/// token and the configuration change watcher.
#[derive(Clone)]
pub struct NacosClient {
    transport: OpenApiClient,
    auth: AuthOps,
    config_ops: ConfigOps,
    instances: InstanceOps,
    services: ServiceOps,
    namespaces: NamespaceOps,
    operator: OperatorOps,
}

impl NacosClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = OpenApiClient::new(config)?;
        Ok(Self {
            auth: AuthOps::new(transport.clone()),
            config_ops: ConfigOps::new(transport.clone()),
            instances: InstanceOps::new(transport.clone()),
            services: ServiceOps::new(transport.clone()),
            namespaces: NamespaceOps::new(transport.clone()),
            operator: OperatorOps::new(transport.clone()),
            transport,
        })
    }

    /// Builds a client against the given server address with defaults for
    /// everything else.
    pub fn connect(server_address: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(server_address))
    }

    pub fn config(&self) -> &ClientConfig {
        self.transport.config()
    }

    pub fn auth(&self) -> &AuthOps {
        &self.auth
    }

    /// Configuration management: publish, fetch, history and change watching.
    pub fn configs(&self) -> &ConfigOps {
        &self.config_ops
    }

    /// Instance registration and queries of the naming module.
    pub fn instances(&self) -> &InstanceOps {
        &self.instances
    }

    /// Service definitions of the naming module.
    pub fn services(&self) -> &ServiceOps {
        &self.services
    }

    pub fn namespaces(&self) -> &NamespaceOps {
        &self.namespaces
    }

    /// Cluster state and the v2 client registry.
    pub fn operator(&self) -> &OperatorOps {
        &self.operator
    }
}

impl std::fmt::Debug for NacosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NacosClient")
            .field("server", &self.config().server_address())
            .finish()
    }
}
