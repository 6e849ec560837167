use serde::{Deserialize, Serialize};

/// Namespace id Nacos treats as the default tenant.
pub const DEFAULT_NAMESPACE_ID: &str = "public";

pub const DEFAULT_GROUP_NAME: &str = "DEFAULT_GROUP";

pub const DEFAULT_CLUSTER_NAME: &str = "DEFAULT";

/// Separator between group and service name in composed service names.
pub const GROUP_SERVICE_NAME_SEPARATOR: &str = "@@";

pub const DEFAULT_PAGE_NUMBER: u32 = 1;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

pub const MAX_PAGE_SIZE: u32 = 500;

/// One page of results, using the server's pagination field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total_count: u64,
    pub page_number: u32,
    pub pages_available: u32,
    #[serde(default = "Vec::new")]
    pub page_items: Vec<T>,
}

impl<T> Page<T> {
    pub fn from_parts(total_count: u64, page_number: u32, page_size: u32, items: Vec<T>) -> Self {
        let pages_available = if page_size == 0 {
            0
        } else {
            total_count.div_ceil(page_size as u64) as u32
        };
        Self {
            total_count,
            page_number,
            pages_available,
            page_items: items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.page_items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.page_items.len()
    }
}

/// Envelope wrapping console and v2 API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}
