use crate::core::transport::{OpenApiClient, OpenApiRequest};
use crate::domain::config::{ConfigEntry, ConfigId, HistoryConfig, NewConfig};
use crate::domain::model::{Page, DEFAULT_NAMESPACE_ID, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::domain::ports::{ConfigChangeKind, ConfigChangedEvent, ConfigChangedListener};
use crate::utils::error::Result;
use crate::utils::validation::validate_range;
use md5::{Digest, Md5};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

const CONFIG_ENDPOINT: &str = "/v1/cs/configs";
const HISTORY_ENDPOINT: &str = "/v1/cs/history";
const HISTORY_PREVIOUS_ENDPOINT: &str = "/v1/cs/history/previous";
const LISTENER_ENDPOINT: &str = "/v1/cs/configs/listener";

const LISTENING_CONFIGS_PARAM: &str = "Listening-Configs";
const LONG_POLL_TIMEOUT_HEADER: &str = "Long-Pulling-Timeout";

/// Separators of the packed `Listening-Configs` field.
const LINE_SEPARATOR: char = '\u{1}';
const FIELD_SEPARATOR: char = '\u{2}';

/// Slack added on top of the server-side hold time.
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);

/// Pause between polls that produced no change.
const IDLE_POLL_DELAY: Duration = Duration::from_millis(500);

/// Backoff after a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(1);

struct WatchEntry {
    md5: String,
    listeners: Vec<Arc<dyn ConfigChangedListener>>,
}

struct WatcherState {
    entries: Mutex<HashMap<ConfigId, WatchEntry>>,
    /// `true` requests the poll task to stop; checked every round, including
    /// during the sleeps between rounds.
    stop: watch::Sender<bool>,
    /// Whether a poll task currently owns the registry.
    running: AtomicBool,
}

/// Configuration management operations.
#[derive(Clone)]
pub struct ConfigOps {
    transport: OpenApiClient,
    watcher: Arc<WatcherState>,
}

impl ConfigOps {
    pub fn new(transport: OpenApiClient) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            transport,
            watcher: Arc::new(WatcherState {
                entries: Mutex::new(HashMap::new()),
                stop,
                running: AtomicBool::new(false),
            }),
        }
    }

    /// Fetches the raw content of a configuration item. `Ok(None)` when the
    /// item does not exist.
    pub async fn get_config_content(&self, id: &ConfigId) -> Result<Option<String>> {
        self.get_content_inner(id, None).await
    }

    /// Fetches the content of a tagged (gray) configuration item.
    pub async fn get_config_content_tagged(
        &self,
        id: &ConfigId,
        tag: &str,
    ) -> Result<Option<String>> {
        self.get_content_inner(id, Some(tag)).await
    }

    async fn get_content_inner(&self, id: &ConfigId, tag: Option<&str>) -> Result<Option<String>> {
        let request = OpenApiRequest::get(CONFIG_ENDPOINT)
            .param("dataId", &id.data_id)
            .param("group", &id.group)
            .tenant_param("tenant", &id.namespace_id)
            .opt_param("tag", tag);
        self.transport.send_optional(&request).await
    }

    /// Fetches the full configuration item including server-side metadata.
    pub async fn get_config(&self, id: &ConfigId) -> Result<Option<ConfigEntry>> {
        let request = OpenApiRequest::get(CONFIG_ENDPOINT)
            .param("dataId", &id.data_id)
            .param("group", &id.group)
            .tenant_param("tenant", &id.namespace_id)
            .param("show", "all");
        self.transport.fetch_optional_json(&request).await
    }

    /// Publishes (creates or updates) a configuration item.
    pub async fn publish_config(&self, config: &NewConfig) -> Result<bool> {
        let request = OpenApiRequest::post(CONFIG_ENDPOINT)
            .param("dataId", &config.id.data_id)
            .param("group", &config.id.group)
            .tenant_param("tenant", &config.id.namespace_id)
            .param("content", &config.content)
            .opt_param("type", config.config_type.map(|t| t.as_str()))
            .opt_param("tag", config.tag.as_deref())
            .opt_param("appName", config.app_name.as_deref());
        self.transport.execute_ok(&request).await
    }

    pub async fn delete_config(&self, id: &ConfigId) -> Result<bool> {
        self.delete_inner(id, None).await
    }

    pub async fn delete_config_tagged(&self, id: &ConfigId, tag: &str) -> Result<bool> {
        self.delete_inner(id, Some(tag)).await
    }

    async fn delete_inner(&self, id: &ConfigId, tag: Option<&str>) -> Result<bool> {
        let request = OpenApiRequest::delete(CONFIG_ENDPOINT)
            .param("dataId", &id.data_id)
            .param("group", &id.group)
            .tenant_param("tenant", &id.namespace_id)
            .opt_param("tag", tag);
        self.transport.execute_ok(&request).await
    }

    /// Pages through the revision history of a configuration item.
    /// Page numbers start at 1; page size is capped at 500.
    pub async fn get_history_configs(
        &self,
        id: &ConfigId,
        page_number: u32,
        page_size: u32,
    ) -> Result<Page<HistoryConfig>> {
        validate_range("page_number", page_number, 1, u32::MAX)?;
        validate_range("page_size", page_size, 1, MAX_PAGE_SIZE)?;

        let request = OpenApiRequest::get(HISTORY_ENDPOINT)
            .param("search", "accurate")
            .param("dataId", &id.data_id)
            .param("group", &id.group)
            .tenant_param("tenant", &id.namespace_id)
            .param("pageNo", page_number)
            .param("pageSize", page_size);
        self.transport.fetch_json(&request).await
    }

    /// First page of history with the default page size.
    pub async fn get_history(&self, id: &ConfigId) -> Result<Page<HistoryConfig>> {
        self.get_history_configs(id, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE)
            .await
    }

    /// Fetches one history revision by its revision number.
    pub async fn get_history_config(
        &self,
        id: &ConfigId,
        revision: u64,
    ) -> Result<Option<HistoryConfig>> {
        let request = OpenApiRequest::get(HISTORY_ENDPOINT)
            .param("dataId", &id.data_id)
            .param("group", &id.group)
            .tenant_param("tenant", &id.namespace_id)
            .param("nid", revision);
        self.transport.fetch_optional_json(&request).await
    }

    /// Fetches the revision preceding the given config row id.
    pub async fn get_previous_history_config(
        &self,
        id: &ConfigId,
        config_row_id: &str,
    ) -> Result<Option<HistoryConfig>> {
        let request = OpenApiRequest::get(HISTORY_PREVIOUS_ENDPOINT)
            .param("id", config_row_id)
            .param("dataId", &id.data_id)
            .param("group", &id.group)
            .tenant_param("tenant", &id.namespace_id);
        self.transport.fetch_optional_json(&request).await
    }

    /// Registers a listener for changes of one configuration item and starts
    /// the long-poll watcher if it is not running yet.
    pub async fn add_listener(
        &self,
        id: ConfigId,
        listener: Arc<dyn ConfigChangedListener>,
    ) -> Result<()> {
        let content = self.get_config_content(&id).await?;
        let md5 = content.as_deref().map(content_md5).unwrap_or_default();

        {
            let mut entries = self.watcher.entries.lock().await;
            entries
                .entry(id)
                .or_insert_with(|| WatchEntry {
                    md5,
                    listeners: Vec::new(),
                })
                .listeners
                .push(listener);
        }
        self.start_watcher();
        Ok(())
    }

    /// Spawns the poll task unless one is already running, clearing any
    /// earlier stop request so watching resumes after [`close`](Self::close).
    fn start_watcher(&self) {
        // Clear the flag before the running check: a task that saw the stop
        // request but has not exited yet picks the cleared flag up and keeps
        // going instead of orphaning the new listener.
        self.watcher.stop.send_replace(false);
        if self.watcher.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let transport = self.transport.clone();
        let watcher = Arc::clone(&self.watcher);
        tokio::spawn(async move {
            watch_loop(transport, watcher).await;
        });
    }

    /// Removes a previously registered listener. The watcher stops once no
    /// listeners remain.
    pub async fn remove_listener(&self, id: &ConfigId, listener: &Arc<dyn ConfigChangedListener>) {
        let mut entries = self.watcher.entries.lock().await;
        if let Some(entry) = entries.get_mut(id) {
            entry.listeners.retain(|l| !Arc::ptr_eq(l, listener));
            if entry.listeners.is_empty() {
                entries.remove(id);
            }
        }
        if entries.is_empty() {
            self.watcher.stop.send_replace(true);
        }
    }

    /// Stops the change watcher. Registered listeners stay in place and a
    /// subsequent [`add_listener`](Self::add_listener) restarts polling.
    pub fn close(&self) {
        self.watcher.stop.send_replace(true);
    }
}

async fn watch_loop(transport: OpenApiClient, watcher: Arc<WatcherState>) {
    tracing::debug!("Config change watcher started");
    loop {
        run_polls(&transport, &watcher).await;
        watcher.running.store(false, Ordering::SeqCst);
        // An add_listener racing with this exit may have cleared the stop
        // flag without spawning a task; resume rather than leave registered
        // listeners without a watcher.
        let resume = !*watcher.stop.borrow()
            && !watcher.entries.lock().await.is_empty()
            && !watcher.running.swap(true, Ordering::SeqCst);
        if !resume {
            break;
        }
    }
    tracing::debug!("Config change watcher stopped");
}

/// Polls until a stop is requested or no watched entries remain. The stop
/// flag interrupts both in-flight polls and the sleeps between rounds.
async fn run_polls(transport: &OpenApiClient, watcher: &WatcherState) {
    let mut stop = watcher.stop.subscribe();
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if watcher.entries.lock().await.is_empty() {
            return;
        }

        let outcome = tokio::select! {
            _ = stop.changed() => return,
            result = poll_changes(transport, watcher) => result,
        };
        let delay = match outcome {
            Ok(true) => continue,
            Ok(false) => IDLE_POLL_DELAY,
            Err(e) => {
                tracing::warn!("Config long poll failed: {}", e);
                POLL_RETRY_DELAY
            }
        };
        tokio::select! {
            _ = stop.changed() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// One long-poll round trip. Returns whether any event was dispatched.
async fn poll_changes(transport: &OpenApiClient, watcher: &WatcherState) -> Result<bool> {
    let packed = {
        let entries = watcher.entries.lock().await;
        if entries.is_empty() {
            return Ok(false);
        }
        pack_listening_configs(entries.iter().map(|(id, entry)| (id, entry.md5.as_str())))
    };

    let timeout = transport.config().long_poll_timeout();
    let request = OpenApiRequest::post(LISTENER_ENDPOINT)
        .param(LISTENING_CONFIGS_PARAM, packed)
        .header(LONG_POLL_TIMEOUT_HEADER, timeout.as_millis())
        .read_timeout(timeout + LONG_POLL_GRACE);

    let body = transport.send(&request).await?;
    let changed = parse_changed_keys(&body)?;
    if changed.is_empty() {
        return Ok(false);
    }

    let mut dispatched = false;
    for key in changed {
        if let Some(id) = resolve_watched_id(watcher, &key).await {
            if notify_change(transport, watcher, id).await? {
                dispatched = true;
            }
        }
    }
    Ok(dispatched)
}

/// Re-fetches the item, updates the cached digest and notifies listeners.
async fn notify_change(
    transport: &OpenApiClient,
    watcher: &WatcherState,
    id: ConfigId,
) -> Result<bool> {
    let request = OpenApiRequest::get(CONFIG_ENDPOINT)
        .param("dataId", &id.data_id)
        .param("group", &id.group)
        .tenant_param("tenant", &id.namespace_id);
    let content: Option<String> = transport.send_optional(&request).await?;
    let new_md5 = content.as_deref().map(content_md5).unwrap_or_default();

    let (listeners, kind) = {
        let mut entries = watcher.entries.lock().await;
        let Some(entry) = entries.get_mut(&id) else {
            return Ok(false);
        };
        if entry.md5 == new_md5 {
            return Ok(false);
        }
        let kind = if content.is_none() {
            ConfigChangeKind::Deleted
        } else if entry.md5.is_empty() {
            ConfigChangeKind::Created
        } else {
            ConfigChangeKind::Modified
        };
        entry.md5 = new_md5;
        (entry.listeners.clone(), kind)
    };

    let event = ConfigChangedEvent {
        id,
        content,
        kind,
    };
    tracing::debug!(data_id = %event.id.data_id, kind = ?event.kind, "Config changed");
    for listener in listeners {
        listener.on_change(event.clone()).await;
    }
    Ok(true)
}

async fn resolve_watched_id(watcher: &WatcherState, key: &ChangedKey) -> Option<ConfigId> {
    let entries = watcher.entries.lock().await;
    entries
        .keys()
        .find(|id| {
            id.data_id == key.data_id
                && id.group == key.group
                && match key.tenant.as_deref() {
                    Some(tenant) => id.namespace_id == tenant,
                    None => {
                        id.namespace_id.is_empty() || id.namespace_id == DEFAULT_NAMESPACE_ID
                    }
                }
        })
        .cloned()
}

pub(crate) fn content_md5(content: &str) -> String {
    let digest = Md5::digest(content.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Packs the watched set into the `Listening-Configs` wire field:
/// `dataId ^2 group ^2 md5 [^2 tenant] ^1` per item.
pub(crate) fn pack_listening_configs<'a>(
    entries: impl Iterator<Item = (&'a ConfigId, &'a str)>,
) -> String {
    let mut packed = String::new();
    for (id, md5) in entries {
        packed.push_str(&id.data_id);
        packed.push(FIELD_SEPARATOR);
        packed.push_str(&id.group);
        packed.push(FIELD_SEPARATOR);
        packed.push_str(md5);
        if !id.namespace_id.is_empty() && id.namespace_id != DEFAULT_NAMESPACE_ID {
            packed.push(FIELD_SEPARATOR);
            packed.push_str(&id.namespace_id);
        }
        packed.push(LINE_SEPARATOR);
    }
    packed
}

#[derive(Debug, PartialEq)]
pub(crate) struct ChangedKey {
    pub data_id: String,
    pub group: String,
    pub tenant: Option<String>,
}

/// Parses the percent-encoded changed-key list of a listener response.
pub(crate) fn parse_changed_keys(body: &str) -> Result<Vec<ChangedKey>> {
    let decoded = percent_decode_str(body.trim())
        .decode_utf8()
        .map_err(|e| crate::utils::error::NacosError::unexpected(format!(
            "Invalid listener response encoding: {}",
            e
        )))?;

    let mut keys = Vec::new();
    for line in decoded.split(LINE_SEPARATOR) {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        match fields.as_slice() {
            [data_id, group] => keys.push(ChangedKey {
                data_id: data_id.to_string(),
                group: group.to_string(),
                tenant: None,
            }),
            [data_id, group, tenant] => keys.push(ChangedKey {
                data_id: data_id.to_string(),
                group: group.to_string(),
                tenant: Some(tenant.to_string()),
            }),
            _ => {
                tracing::warn!("Skipping malformed changed key: {:?}", line);
            }
        }
    }
    Ok(keys)
}
