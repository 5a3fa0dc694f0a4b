pub mod rest;

use crate::error::SourceError;
use async_trait::async_trait;
use model::records::row::RowData;

/// Read side of the migration: a paginated, schema-less record store.
///
/// `fetch_range` must return rows in a stable order for a fixed
/// `order_key`, so reruns and consecutive pages see the same grouping.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Trivial liveness probe; cheap enough to run before every migration.
    async fn ping(&self) -> Result<(), SourceError>;

    /// Reads rows `[offset, offset + limit)` of `table`, ordered by
    /// `order_key` ascending.
    async fn fetch_range(
        &self,
        table: &str,
        order_key: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RowData>, SourceError>;

    /// Reads up to `limit` rows, optionally filtered by an exact column
    /// match. Diagnostics only; never used on the write path.
    async fn fetch_filtered(
        &self,
        table: &str,
        filter: Option<(&str, &str)>,
        limit: usize,
    ) -> Result<Vec<RowData>, SourceError>;
}
