//! JSONB-backed implementation of [`MetadataStore`].

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgPool;
use tracing::{debug, info};

use drivehub_core::error::{AppError, ErrorKind};
use drivehub_core::result::AppResult;
use drivehub_core::traits::metadata::{MetadataStore, ScanPage, record_id};

use super::connection::DatabasePool;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS drive_records (
    table_name TEXT NOT NULL,
    id         TEXT NOT NULL,
    item       JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (table_name, id)
)
"#;

/// Metadata store persisting every logical table in `drive_records`.
#[derive(Debug, Clone)]
pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    /// Wrap an open pool.
    pub fn new(pool: &DatabasePool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }

    /// Create the backing table if it does not exist.
    pub async fn ensure_schema(&self) -> AppResult<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to create drive_records", e))?;
        info!("Metadata schema ready");
        Ok(())
    }
}

fn db_error(context: &str, err: sqlx::Error) -> AppError {
    let kind = match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            ErrorKind::ServiceUnavailable
        }
        _ => ErrorKind::Database,
    };
    AppError::with_source(kind, format!("{context}: {err}"), err)
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    fn provider_type(&self) -> &str {
        "postgres"
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| db_error("Health check failed", e))
    }

    async fn put(&self, table: &str, item: Value) -> AppResult<()> {
        let id = record_id(&item)
            .ok_or_else(|| AppError::validation("Metadata records require a string id"))?
            .to_string();
        if !item.is_object() {
            return Err(AppError::validation("Metadata records must be JSON objects"));
        }

        sqlx::query(
            r#"
            INSERT INTO drive_records (table_name, id, item)
            VALUES ($1, $2, $3)
            ON CONFLICT (table_name, id)
            DO UPDATE SET item = EXCLUDED.item, updated_at = NOW()
            "#,
        )
        .bind(table)
        .bind(&id)
        .bind(&item)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to put record", e))?;

        debug!(table, id = %id, "Put record");
        Ok(())
    }

    async fn get(&self, table: &str, id: &str) -> AppResult<Option<Value>> {
        sqlx::query_scalar::<_, Value>(
            "SELECT item FROM drive_records WHERE table_name = $1 AND id = $2",
        )
        .bind(table)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to get record", e))
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        mut updates: Map<String, Value>,
    ) -> AppResult<Value> {
        updates.remove("id");

        let updated = sqlx::query_scalar::<_, Value>(
            r#"
            UPDATE drive_records
            SET item = item || $3, updated_at = NOW()
            WHERE table_name = $1 AND id = $2
            RETURNING item
            "#,
        )
        .bind(table)
        .bind(id)
        .bind(Value::Object(updates))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update record", e))?;

        updated.ok_or_else(|| AppError::not_found(format!("Record {id} not found in {table}")))
    }

    async fn delete(&self, table: &str, id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM drive_records WHERE table_name = $1 AND id = $2")
            .bind(table)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete record", e))?;
        Ok(())
    }

    async fn scan(
        &self,
        table: &str,
        page_size: usize,
        start_token: Option<&str>,
    ) -> AppResult<ScanPage> {
        let page_size = page_size.max(1);
        let rows: Vec<(String, Value)> = sqlx::query_as(
            r#"
            SELECT id, item FROM drive_records
            WHERE table_name = $1 AND ($2::TEXT IS NULL OR id > $2)
            ORDER BY id
            LIMIT $3
            "#,
        )
        .bind(table)
        .bind(start_token)
        .bind(page_size as i64 + 1)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to scan records", e))?;

        let has_more = rows.len() > page_size;
        let mut items = Vec::with_capacity(page_size.min(rows.len()));
        let mut last_id = None;
        for (id, item) in rows.into_iter().take(page_size) {
            last_id = Some(id);
            items.push(item);
        }

        Ok(ScanPage {
            items,
            next_token: if has_more { last_id } else { None },
        })
    }
}
