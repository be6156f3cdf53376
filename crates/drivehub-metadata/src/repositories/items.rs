//! File and folder records in the drive files table.

use std::sync::Arc;

use serde_json::{Map, Value};

use drivehub_core::error::AppError;
use drivehub_core::result::AppResult;
use drivehub_core::traits::metadata::MetadataStore;
use drivehub_entity::{DriveItem, File, FileId, Folder, FolderId, ParentRef};

use super::scan_table;

/// Repository for [`DriveItem`] records.
#[derive(Debug, Clone)]
pub struct DriveItemRepository {
    store: Arc<dyn MetadataStore>,
    table: String,
    page_size: usize,
}

impl DriveItemRepository {
    /// Create a repository over `table`.
    pub fn new(store: Arc<dyn MetadataStore>, table: impl Into<String>, page_size: usize) -> Self {
        Self {
            store,
            table: table.into(),
            page_size: page_size.max(1),
        }
    }

    /// The logical table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Find a record of either kind by id.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<DriveItem>> {
        match self.store.get(&self.table, id).await? {
            Some(value) => Ok(Some(decode_item(value)?)),
            None => Ok(None),
        }
    }

    /// Find a file record. A folder stored under the id yields `None`.
    pub async fn find_file(&self, id: &FileId) -> AppResult<Option<File>> {
        Ok(self
            .find_by_id(id.as_str())
            .await?
            .and_then(DriveItem::into_file))
    }

    /// Find a folder record. A file stored under the id yields `None`.
    pub async fn find_folder(&self, id: &FolderId) -> AppResult<Option<Folder>> {
        Ok(self
            .find_by_id(id.as_str())
            .await?
            .and_then(DriveItem::into_folder))
    }

    /// Insert or replace a record.
    pub async fn save(&self, item: &DriveItem) -> AppResult<()> {
        let value = serde_json::to_value(item)?;
        self.store.put(&self.table, value).await
    }

    /// Shallow-merge `updates` into the record and return it.
    pub async fn update(&self, id: &str, updates: Map<String, Value>) -> AppResult<DriveItem> {
        let value = self.store.update(&self.table, id, updates).await?;
        decode_item(value)
    }

    /// Delete a record.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.store.delete(&self.table, id).await
    }

    /// Every record in the table.
    pub async fn scan_all(&self) -> AppResult<Vec<DriveItem>> {
        scan_table(self.store.as_ref(), &self.table, self.page_size).await
    }

    /// Every record owned by `owner_id` in `namespace_id`.
    pub async fn find_scoped(
        &self,
        owner_id: &str,
        namespace_id: &str,
    ) -> AppResult<Vec<DriveItem>> {
        let mut items: Vec<DriveItem> = self
            .scan_all()
            .await?
            .into_iter()
            .filter(|item| item.is_scoped_to(owner_id, namespace_id))
            .collect();
        items.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then_with(|| a.id().cmp(b.id())));
        Ok(items)
    }

    /// Direct children of `parent` in the owner's namespace, oldest first.
    pub async fn find_children(
        &self,
        owner_id: &str,
        namespace_id: &str,
        parent: &ParentRef,
    ) -> AppResult<Vec<DriveItem>> {
        Ok(self
            .find_scoped(owner_id, namespace_id)
            .await?
            .into_iter()
            .filter(|item| item.parent_id() == parent)
            .collect())
    }
}

fn decode_item(value: Value) -> AppResult<DriveItem> {
    serde_json::from_value(value)
        .map_err(|e| AppError::internal(format!("Malformed drive record: {e}")))
}
