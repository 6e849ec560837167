pub mod auth;
pub mod config;
pub mod discovery;
pub mod model;
pub mod namespace;
pub mod ops;
pub mod ports;

pub use model::{Page, DEFAULT_GROUP_NAME, DEFAULT_NAMESPACE_ID};
pub use ports::{ConfigChangeKind, ConfigChangedEvent, ConfigChangedListener};
