pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::ClientConfig;
pub use crate::core::{client::NacosClient, transport::OpenApiClient};
pub use domain::config::{ConfigId, ConfigType, NewConfig};
pub use domain::discovery::{InstanceKey, InstanceListQuery, NewInstance, Service};
pub use domain::ports::{ConfigChangeKind, ConfigChangedEvent, ConfigChangedListener};
pub use utils::error::{NacosError, Result};
