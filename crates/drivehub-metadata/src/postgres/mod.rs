//! PostgreSQL metadata backend.
//!
//! Every logical table lives in one `drive_records` table keyed by
//! `(table_name, id)`, with the record itself stored as JSONB.

pub mod connection;
pub mod store;

pub use connection::DatabasePool;
pub use store::PgMetadataStore;
