pub mod ident;
pub mod insert;

use crate::{
    error::WriteError,
    write::insert::{build_batch_insert, effective_columns},
};
use connectors::sql::TargetStore;
use model::{records::row::RowData, table::TableKind};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Failure policy for batch writes. Callers pick it explicitly; nothing is
/// inferred from the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    /// Primary migration path: every batch runs inside one transaction per
    /// table, conflicts on the natural key overwrite, the first batch
    /// failure rolls the whole table back.
    Upsert,
    /// Fire-and-forget reload: plain inserts, each batch commits on its
    /// own, a failing batch is degraded to row-by-row inserts and logged.
    BestEffort,
}

#[derive(Debug, Default)]
pub struct WriteReport {
    pub rows_written: u64,
    pub batch_errors: Vec<String>,
}

/// Converts normalized rows into parameterized multi-row statements and
/// executes them against the target.
pub struct BatchWriter {
    batch_size: usize,
    mode: WriteMode,
}

impl BatchWriter {
    pub fn new(batch_size: usize, mode: WriteMode) -> Self {
        BatchWriter {
            batch_size: batch_size.max(1),
            mode,
        }
    }

    /// Writes all rows for one table. `target_columns` must come from the
    /// target catalog; when it is empty the whole write is skipped with a
    /// warning rather than failed.
    pub async fn write_all(
        &self,
        target: &dyn TargetStore,
        table: TableKind,
        rows: &[RowData],
        target_columns: &[String],
    ) -> Result<WriteReport, WriteError> {
        let name = table.table_name();

        if target_columns.is_empty() {
            warn!(table = name, "target schema has no columns, skipping write");
            return Ok(WriteReport::default());
        }
        if rows.is_empty() {
            return Ok(WriteReport::default());
        }

        match self.mode {
            WriteMode::Upsert => self.write_transactional(target, table, rows, target_columns).await,
            WriteMode::BestEffort => {
                Ok(self.write_best_effort(target, table, rows, target_columns).await)
            }
        }
    }

    async fn write_transactional(
        &self,
        target: &dyn TargetStore,
        table: TableKind,
        rows: &[RowData],
        target_columns: &[String],
    ) -> Result<WriteReport, WriteError> {
        let name = table.table_name();
        let mut report = WriteReport::default();

        target.begin().await.map_err(|source| WriteError::Transaction {
            table: name.to_string(),
            source,
        })?;

        for (index, batch) in rows.chunks(self.batch_size).enumerate() {
            let columns = effective_columns(target_columns, batch);
            if columns.is_empty() {
                warn!(table = name, batch = index, "batch shares no columns with target, skipped");
                continue;
            }

            let stmt = build_batch_insert(name, table.natural_key(), &columns, batch, true);
            if let Err(source) = target.execute(&stmt.sql, stmt.params).await {
                // Whatever already executed in this transaction is undone;
                // no partial table is ever committed.
                if let Err(rb) = target.rollback().await {
                    warn!(table = name, error = %rb, "rollback after batch failure also failed");
                }
                return Err(WriteError::Batch {
                    table: name.to_string(),
                    batch: index,
                    source,
                });
            }
            report.rows_written += batch.len() as u64;
        }

        target.commit().await.map_err(|source| WriteError::Transaction {
            table: name.to_string(),
            source,
        })?;

        info!(table = name, rows = report.rows_written, mode = "upsert", "table write committed");
        Ok(report)
    }

    async fn write_best_effort(
        &self,
        target: &dyn TargetStore,
        table: TableKind,
        rows: &[RowData],
        target_columns: &[String],
    ) -> WriteReport {
        let name = table.table_name();
        let mut report = WriteReport::default();

        for (index, batch) in rows.chunks(self.batch_size).enumerate() {
            let columns = effective_columns(target_columns, batch);
            if columns.is_empty() {
                warn!(table = name, batch = index, "batch shares no columns with target, skipped");
                continue;
            }

            let stmt = build_batch_insert(name, table.natural_key(), &columns, batch, false);
            match target.execute(&stmt.sql, stmt.params).await {
                Ok(_) => report.rows_written += batch.len() as u64,
                Err(err) => {
                    // Salvage the batch row by row so a handful of bad
                    // records does not sink the other ninety-odd.
                    warn!(table = name, batch = index, error = %err, "batch failed, degrading to row-by-row");
                    report.batch_errors.push(format!("batch {index}: {err}"));
                    for row in batch {
                        let single =
                            build_batch_insert(name, table.natural_key(), &columns, std::slice::from_ref(row), false);
                        match target.execute(&single.sql, single.params).await {
                            Ok(_) => report.rows_written += 1,
                            Err(row_err) => {
                                report.batch_errors.push(format!(
                                    "batch {index}, key {}: {row_err}",
                                    row.get_value(table.natural_key())
                                ));
                            }
                        }
                    }
                }
            }
        }

        info!(
            table = name,
            rows = report.rows_written,
            errors = report.batch_errors.len(),
            mode = "best_effort",
            "table write finished"
        );
        report
    }
}
