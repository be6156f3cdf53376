//! Share records in the shared drive table.

use std::sync::Arc;

use serde_json::{Map, Value};

use drivehub_core::error::AppError;
use drivehub_core::result::AppResult;
use drivehub_core::traits::metadata::MetadataStore;
use drivehub_entity::{ShareId, ShareRecord};

use super::scan_table;

/// Repository for [`ShareRecord`]s.
#[derive(Debug, Clone)]
pub struct ShareRepository {
    store: Arc<dyn MetadataStore>,
    table: String,
    page_size: usize,
}

impl ShareRepository {
    /// Create a repository over `table`.
    pub fn new(store: Arc<dyn MetadataStore>, table: impl Into<String>, page_size: usize) -> Self {
        Self {
            store,
            table: table.into(),
            page_size: page_size.max(1),
        }
    }

    /// Find a share by id.
    pub async fn find_by_id(&self, id: &ShareId) -> AppResult<Option<ShareRecord>> {
        match self.store.get(&self.table, id.as_str()).await? {
            Some(value) => Ok(Some(decode_share(value)?)),
            None => Ok(None),
        }
    }

    /// Persist a new share.
    pub async fn create(&self, share: &ShareRecord) -> AppResult<()> {
        self.store
            .put(&self.table, serde_json::to_value(share)?)
            .await
    }

    /// Shallow-merge `updates` into a share and return it.
    pub async fn update(
        &self,
        id: &ShareId,
        updates: Map<String, Value>,
    ) -> AppResult<ShareRecord> {
        let value = self.store.update(&self.table, id.as_str(), updates).await?;
        decode_share(value)
    }

    /// Every share in the table.
    pub async fn scan_all(&self) -> AppResult<Vec<ShareRecord>> {
        scan_table(self.store.as_ref(), &self.table, self.page_size).await
    }

    /// Shares granted to `user_id`, in any status, newest first.
    pub async fn find_by_grantee(&self, user_id: &str) -> AppResult<Vec<ShareRecord>> {
        let mut shares: Vec<ShareRecord> = self
            .scan_all()
            .await?
            .into_iter()
            .filter(|s| s.shared_with_user_id == user_id)
            .collect();
        newest_first(&mut shares);
        Ok(shares)
    }

    /// Shares created by `user_id`, in any status, newest first.
    pub async fn find_by_owner(&self, user_id: &str) -> AppResult<Vec<ShareRecord>> {
        let mut shares: Vec<ShareRecord> = self
            .scan_all()
            .await?
            .into_iter()
            .filter(|s| s.original_owner_id == user_id)
            .collect();
        newest_first(&mut shares);
        Ok(shares)
    }
}

fn newest_first(shares: &mut [ShareRecord]) {
    shares.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

fn decode_share(value: Value) -> AppResult<ShareRecord> {
    serde_json::from_value(value)
        .map_err(|e| AppError::internal(format!("Malformed share record: {e}")))
}
