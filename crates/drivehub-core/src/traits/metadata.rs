//! Metadata store trait: the key/value record seam behind every drive table.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::result::AppResult;

/// One page of a table scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// Records on this page, in store order.
    pub items: Vec<Value>,
    /// Token to pass to the next `scan` call, `None` on the last page.
    pub next_token: Option<String>,
}

/// Generic key/value record store.
///
/// Every record is a JSON object with a string `id` field that is the
/// primary key within its table. Implementations exist for an in-memory
/// map and a PostgreSQL JSONB table in `drivehub-metadata`.
#[async_trait]
pub trait MetadataStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend name (e.g., "memory", "postgres").
    fn provider_type(&self) -> &str;

    /// Check whether the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Insert or replace the record identified by `item["id"]`.
    async fn put(&self, table: &str, item: Value) -> AppResult<()>;

    /// Fetch a record by id.
    async fn get(&self, table: &str, id: &str) -> AppResult<Option<Value>>;

    /// Shallow-merge `updates` into an existing record and return the result.
    ///
    /// Fails with `NotFound` if the record does not exist. The `id` field
    /// cannot be changed.
    async fn update(&self, table: &str, id: &str, updates: Map<String, Value>) -> AppResult<Value>;

    /// Delete a record. Deleting a missing record is not an error.
    async fn delete(&self, table: &str, id: &str) -> AppResult<()>;

    /// Read up to `page_size` records starting after `start_token`.
    async fn scan(
        &self,
        table: &str,
        page_size: usize,
        start_token: Option<&str>,
    ) -> AppResult<ScanPage>;
}

/// Extract the primary key from a record.
pub fn record_id(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())
}
