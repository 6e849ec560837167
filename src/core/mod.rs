pub mod auth;
pub mod client;
pub mod config;
pub mod discovery;
pub mod namespace;
pub mod ops;
pub mod transport;

pub use crate::domain::config::{ConfigId, NewConfig};
pub use crate::domain::discovery::{InstanceKey, InstanceListQuery, NewInstance, Service};
pub use crate::utils::error::Result;
pub use client::NacosClient;
