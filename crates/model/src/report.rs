use crate::table::TableKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of migrating a single table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableOutcome {
    pub table: TableKind,

    /// Rows read from the source store.
    pub source_rows: usize,

    /// Rows present in the target table after the write.
    pub target_rows: i64,

    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TableOutcome {
    pub fn failure(table: TableKind, source_rows: usize, error: impl Into<String>) -> Self {
        TableOutcome {
            table,
            source_rows,
            target_rows: 0,
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every table migrated successfully.
    Complete,
    /// At least one table failed; the others were still attempted.
    Partial,
}

/// Aggregate summary of one orchestrator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub outcomes: Vec<TableOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn new(outcomes: Vec<TableOutcome>, started_at: DateTime<Utc>) -> Self {
        let status = if outcomes.iter().all(|o| o.success) {
            RunStatus::Complete
        } else {
            RunStatus::Partial
        };
        RunSummary {
            status,
            outcomes,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn tables_migrated(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn tables_failed(&self) -> usize {
        self.outcomes.len() - self.tables_migrated()
    }

    pub fn rows_written(&self) -> i64 {
        self.outcomes.iter().map(|o| o.target_rows.max(0)).sum()
    }
}
