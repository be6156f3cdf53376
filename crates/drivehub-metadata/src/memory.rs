//! In-memory metadata store backed by a concurrent map of ordered tables.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tracing::debug;

use drivehub_core::error::AppError;
use drivehub_core::result::AppResult;
use drivehub_core::traits::metadata::{MetadataStore, ScanPage, record_id};

/// In-memory metadata store.
///
/// Each table is an id-ordered map so scans are stable and resumable by id.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    tables: DashMap<String, BTreeMap<String, Value>>,
}

impl MemoryMetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a table.
    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map(|t| t.len()).unwrap_or(0)
    }

    /// Whether a table has no records.
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, table: &str, item: Value) -> AppResult<()> {
        if !item.is_object() {
            return Err(AppError::validation("Metadata records must be JSON objects"));
        }
        let id = record_id(&item)
            .ok_or_else(|| AppError::validation("Metadata records require a string id"))?
            .to_string();
        debug!(table, id = %id, "Put record");
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(id, item);
        Ok(())
    }

    async fn get(&self, table: &str, id: &str) -> AppResult<Option<Value>> {
        Ok(self.tables.get(table).and_then(|t| t.get(id).cloned()))
    }

    async fn update(&self, table: &str, id: &str, updates: Map<String, Value>) -> AppResult<Value> {
        let not_found = || AppError::not_found(format!("Record {id} not found in {table}"));
        let mut records = self.tables.get_mut(table).ok_or_else(not_found)?;
        let record = records
            .get_mut(id)
            .and_then(Value::as_object_mut)
            .ok_or_else(not_found)?;

        for (key, value) in updates {
            if key != "id" {
                record.insert(key, value);
            }
        }
        debug!(table, id, "Updated record");
        Ok(Value::Object(record.clone()))
    }

    async fn delete(&self, table: &str, id: &str) -> AppResult<()> {
        if let Some(mut records) = self.tables.get_mut(table) {
            records.remove(id);
        }
        Ok(())
    }

    async fn scan(
        &self,
        table: &str,
        page_size: usize,
        start_token: Option<&str>,
    ) -> AppResult<ScanPage> {
        let Some(records) = self.tables.get(table) else {
            return Ok(ScanPage::default());
        };

        let lower = match start_token {
            Some(token) => Bound::Excluded(token.to_string()),
            None => Bound::Unbounded,
        };
        let mut range = records.range((lower, Bound::Unbounded));
        let page: Vec<(&String, &Value)> = range.by_ref().take(page_size.max(1)).collect();
        let next_token = match range.next() {
            Some(_) => page.last().map(|(id, _)| (*id).clone()),
            None => None,
        };

        Ok(ScanPage {
            items: page.into_iter().map(|(_, item)| item.clone()).collect(),
            next_token,
        })
    }
}
