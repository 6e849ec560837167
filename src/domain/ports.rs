use crate::domain::config::ConfigId;
use async_trait::async_trait;

/// What happened to a watched configuration item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChangeKind {
    Created,
    Modified,
    Deleted,
}

/// Notification delivered to configuration listeners.
#[derive(Debug, Clone)]
pub struct ConfigChangedEvent {
    pub id: ConfigId,
    /// New content; `None` when the item was deleted.
    pub content: Option<String>,
    pub kind: ConfigChangeKind,
}

/// Callback invoked when a watched configuration item changes.
#[async_trait]
pub trait ConfigChangedListener: Send + Sync {
    async fn on_change(&self, event: ConfigChangedEvent);
}
