pub mod postgres;

use crate::error::DbError;
use async_trait::async_trait;
use model::{core::value::Value, records::row::RowData};

/// Write side of the migration: a transactional SQL store.
///
/// The trait stays object-safe so the engine can run against an in-memory
/// implementation in tests. Transactions are controlled with explicit
/// `begin`/`commit`/`rollback` on the single underlying connection; the
/// engine issues all statements sequentially (one table at a time), so no
/// statement can interleave into a foreign transaction.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Trivial liveness probe (`SELECT 1`).
    async fn ping(&self) -> Result<(), DbError>;

    /// Column names of `table` from the catalog, in physical column order.
    /// An unknown table yields an empty list, not an error.
    async fn columns(&self, table: &str) -> Result<Vec<String>, DbError>;

    async fn count(&self, table: &str) -> Result<i64, DbError>;

    /// Unconditionally deletes every row; returns the number removed.
    async fn delete_all(&self, table: &str) -> Result<u64, DbError>;

    async fn begin(&self) -> Result<(), DbError>;
    async fn commit(&self) -> Result<(), DbError>;
    async fn rollback(&self) -> Result<(), DbError>;

    /// Executes one parameterized statement; returns rows affected.
    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, DbError>;

    /// Reads up to `limit` rows for diagnostics; never used on the write
    /// path.
    async fn fetch_sample(&self, table: &str, limit: usize) -> Result<Vec<RowData>, DbError>;
}
