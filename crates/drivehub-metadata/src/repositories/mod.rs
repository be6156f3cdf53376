//! Typed repositories over the generic [`MetadataStore`] record interface.
//!
//! Each repository owns the logical table name it reads and writes and
//! converts between JSON records and entity types.

pub mod items;
pub mod shares;

pub use items::DriveItemRepository;
pub use shares::ShareRepository;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use drivehub_core::result::AppResult;
use drivehub_core::traits::metadata::{MetadataStore, record_id};

/// Read every record of `table`, following scan tokens until exhausted.
///
/// Records that do not decode as `T` are skipped with a warning.
pub(crate) async fn scan_table<T: DeserializeOwned>(
    store: &dyn MetadataStore,
    table: &str,
    page_size: usize,
) -> AppResult<Vec<T>> {
    let mut out = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = store.scan(table, page_size, token.as_deref()).await?;
        for item in page.items {
            if let Some(decoded) = decode_record(table, item) {
                out.push(decoded);
            }
        }
        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    Ok(out)
}

pub(crate) fn decode_record<T: DeserializeOwned>(table: &str, item: Value) -> Option<T> {
    let id = record_id(&item).unwrap_or("<missing>").to_string();
    match serde_json::from_value(item) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(table, id = %id, error = %e, "Skipping malformed record");
            None
        }
    }
}
