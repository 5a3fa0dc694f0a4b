use crate::{
    error::EngineError,
    extract::Extractor,
    normalize::{normalize_rows, project_to_schema},
    settings::Settings,
    write::{BatchWriter, WriteMode},
};
use chrono::Utc;
use connectors::{source::SourceReader, sql::TargetStore};
use model::{
    report::{RunSummary, TableOutcome},
    table::TableKind,
};
use tracing::{error, info, warn};

/// Drives the full pipeline per table: connectivity checks, optional
/// destructive clear, extract, normalize, write, verify. Tables run
/// sequentially to bound load on both stores and keep log ordering
/// deterministic.
///
/// Nothing protects two concurrent runs against the same target table;
/// invoking this concurrently is unsafe by construction.
pub struct Migrator<'a> {
    source: &'a dyn SourceReader,
    target: &'a dyn TargetStore,
    settings: &'a Settings,
}

impl<'a> Migrator<'a> {
    pub fn new(
        source: &'a dyn SourceReader,
        target: &'a dyn TargetStore,
        settings: &'a Settings,
    ) -> Self {
        Migrator {
            source,
            target,
            settings,
        }
    }

    /// Migrates the given tables in order. A failed connectivity probe
    /// aborts the whole run before any table is touched; per-table
    /// failures are recorded and the remaining tables still run.
    pub async fn run(
        &self,
        tables: &[TableKind],
        clear_existing: bool,
    ) -> Result<RunSummary, EngineError> {
        let started_at = Utc::now();
        self.check_connectivity().await?;

        let mut outcomes = Vec::with_capacity(tables.len());
        for &table in tables {
            let outcome = self.migrate_table(table, clear_existing).await;
            if let Some(err) = &outcome.error {
                error!(table = %table, error = %err, "table migration failed");
            }
            outcomes.push(outcome);
        }

        let summary = RunSummary::new(outcomes, started_at);
        info!(
            status = ?summary.status,
            migrated = summary.tables_migrated(),
            failed = summary.tables_failed(),
            "migration run finished"
        );
        Ok(summary)
    }

    async fn check_connectivity(&self) -> Result<(), EngineError> {
        self.source
            .ping()
            .await
            .map_err(|e| EngineError::Connectivity(format!("source store: {e}")))?;
        self.target
            .ping()
            .await
            .map_err(|e| EngineError::Connectivity(format!("target store: {e}")))?;
        Ok(())
    }

    /// One table through the whole pipeline. Every failure is converted
    /// into the outcome's error; nothing propagates past here.
    pub async fn migrate_table(&self, table: TableKind, clear_existing: bool) -> TableOutcome {
        let name = table.table_name();
        info!(table = name, clear_existing, "migrating table");

        if clear_existing {
            if let Err(err) = self.target.delete_all(name).await {
                return TableOutcome::failure(table, 0, format!("clearing target failed: {err}"));
            }
            info!(table = name, "existing target rows cleared");
        }

        let target_columns = match self.target.columns(name).await {
            Ok(columns) => columns,
            Err(err) => {
                return TableOutcome::failure(table, 0, format!("schema introspection failed: {err}"));
            }
        };
        if target_columns.is_empty() {
            // Soft error by design: the table is skipped, the run goes on.
            warn!(table = name, "target table has no columns, skipping");
            return TableOutcome::failure(table, 0, "target table has no columns");
        }

        let extractor = Extractor::new(self.source, self.settings.page_size);
        let extraction = match extractor.extract_all(table).await {
            Ok(extraction) => extraction,
            Err(err) => return TableOutcome::failure(table, 0, err.to_string()),
        };
        let source_rows = extraction.rows.len();

        let normalized = normalize_rows(extraction.rows)
            .into_iter()
            .map(|row| project_to_schema(row, &target_columns))
            .collect::<Vec<_>>();

        let writer = BatchWriter::new(self.settings.batch_size, WriteMode::Upsert);
        if let Err(err) = writer
            .write_all(self.target, table, &normalized, &target_columns)
            .await
        {
            return TableOutcome::failure(table, source_rows, err.to_string());
        }

        let target_rows = match self.target.count(name).await {
            Ok(count) => count,
            Err(err) => {
                return TableOutcome::failure(
                    table,
                    source_rows,
                    format!("verification count failed: {err}"),
                );
            }
        };

        let success = self.verified(source_rows, target_rows);
        if !success {
            warn!(
                table = name,
                source_rows, target_rows, "verification rejected the migrated table"
            );
        }
        TableOutcome {
            table,
            source_rows,
            target_rows,
            success,
            error: (!success).then(|| {
                format!("verification failed: source={source_rows} target={target_rows}")
            }),
        }
    }

    /// Lenient by default (`target > 0` when the source had rows), exact
    /// equality under `strict_verify`. The lenient check tolerates
    /// undercounts; that is historical behavior kept as the default, not a
    /// feature.
    fn verified(&self, source_rows: usize, target_rows: i64) -> bool {
        if self.settings.strict_verify {
            target_rows == source_rows as i64
        } else if source_rows == 0 {
            true
        } else {
            target_rows > 0
        }
    }
}

/// Clears and reloads one table with per-batch tolerance, outside any
/// table-level transaction. Used by the fire-and-forget reload action;
/// the primary migration path is [`Migrator::run`].
pub async fn reload_table(
    source: &dyn SourceReader,
    target: &dyn TargetStore,
    settings: &Settings,
    table: TableKind,
) -> TableOutcome {
    let name = table.table_name();

    if let Err(err) = target.delete_all(name).await {
        return TableOutcome::failure(table, 0, format!("clearing target failed: {err}"));
    }

    let target_columns = match target.columns(name).await {
        Ok(columns) => columns,
        Err(err) => return TableOutcome::failure(table, 0, err.to_string()),
    };

    let extraction = match Extractor::new(source, settings.page_size).extract_all(table).await {
        Ok(extraction) => extraction,
        Err(err) => return TableOutcome::failure(table, 0, err.to_string()),
    };
    let source_rows = extraction.rows.len();

    let normalized = normalize_rows(extraction.rows)
        .into_iter()
        .map(|row| project_to_schema(row, &target_columns))
        .collect::<Vec<_>>();

    let writer = BatchWriter::new(settings.batch_size, WriteMode::BestEffort);
    let report = match writer.write_all(target, table, &normalized, &target_columns).await {
        Ok(report) => report,
        Err(err) => return TableOutcome::failure(table, source_rows, err.to_string()),
    };

    for batch_error in &report.batch_errors {
        warn!(table = name, error = %batch_error, "best-effort reload error");
    }

    let target_rows = target.count(name).await.unwrap_or(report.rows_written as i64);
    TableOutcome {
        table,
        source_rows,
        target_rows,
        success: report.batch_errors.is_empty(),
        error: (!report.batch_errors.is_empty())
            .then(|| format!("{} batch errors during reload", report.batch_errors.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{numbered_rows, MockSource, MockTarget};
    use model::report::RunStatus;

    fn settings() -> Settings {
        Settings {
            page_size: 1000,
            batch_size: 100,
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn unreachable_source_aborts_the_whole_run() {
        let mut source = MockSource::with_rows(vec![]);
        source.ping_ok = false;
        let target = MockTarget::with_columns("rollout_sites", &["site_id"]);
        let settings = settings();
        let migrator = Migrator::new(&source, &target, &settings);

        let err = migrator.run(&[TableKind::RolloutSites], false).await.unwrap_err();
        assert!(matches!(err, EngineError::Connectivity(_)));
        assert!(target.executed_sql().is_empty(), "no table was touched");
    }

    #[tokio::test]
    async fn happy_path_extracts_writes_and_verifies() {
        let source = MockSource::with_rows(numbered_rows("rollout_sites", 250));
        let target = MockTarget::with_columns("rollout_sites", &["site_id", "status"]);
        target.set_count(250);
        let settings = settings();
        let migrator = Migrator::new(&source, &target, &settings);

        let summary = migrator.run(&[TableKind::RolloutSites], false).await.unwrap();
        assert_eq!(summary.status, RunStatus::Complete);
        let outcome = &summary.outcomes[0];
        assert!(outcome.success);
        assert_eq!(outcome.source_rows, 250);
        assert_eq!(outcome.target_rows, 250);
        assert_eq!(target.deletes.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn second_run_over_unchanged_source_keeps_the_same_count() {
        let source = MockSource::with_rows(numbered_rows("rollout_sites", 250));
        let target =
            MockTarget::with_tracked_rows("rollout_sites", &["site_id", "status"], "site_id");
        let settings = settings();
        let migrator = Migrator::new(&source, &target, &settings);

        let first = migrator.run(&[TableKind::RolloutSites], false).await.unwrap();
        let second = migrator.run(&[TableKind::RolloutSites], false).await.unwrap();

        assert_eq!(first.status, RunStatus::Complete);
        assert_eq!(first.outcomes[0].target_rows, 250);
        assert_eq!(
            second.outcomes[0].target_rows, 250,
            "rerunning the upsert path must not duplicate keyed rows"
        );
    }

    #[tokio::test]
    async fn clear_existing_deletes_before_writing() {
        let source = MockSource::with_rows(numbered_rows("rollout_sites", 10));
        let target = MockTarget::with_columns("rollout_sites", &["site_id", "status"]);
        target.set_count(10);
        let settings = settings();
        let migrator = Migrator::new(&source, &target, &settings);

        let summary = migrator.run(&[TableKind::RolloutSites], true).await.unwrap();
        assert_eq!(summary.status, RunStatus::Complete);
        assert_eq!(target.deletes.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_clear_aborts_the_table_before_extraction() {
        let source = MockSource::with_rows(numbered_rows("rollout_sites", 10));
        let mut target = MockTarget::with_columns("rollout_sites", &["site_id"]);
        target.fail_delete = true;
        let settings = settings();
        let migrator = Migrator::new(&source, &target, &settings);

        let outcome = migrator.migrate_table(TableKind::RolloutSites, true).await;
        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("clearing target failed"));
        assert!(source.call_log().is_empty(), "extraction never started");
    }

    #[tokio::test]
    async fn empty_target_schema_is_a_soft_skip() {
        let source = MockSource::with_rows(numbered_rows("site_scores", 10));
        let target = MockTarget::with_columns("another_table", &["site_id"]);
        let settings = settings();
        let migrator = Migrator::new(&source, &target, &settings);

        let summary = migrator.run(&[TableKind::SiteScores], false).await.unwrap();
        assert_eq!(summary.status, RunStatus::Partial);
        assert!(summary.outcomes[0]
            .error
            .as_deref()
            .unwrap()
            .contains("no columns"));
    }

    #[tokio::test]
    async fn extraction_failure_marks_table_but_run_continues() {
        let mut source = MockSource::with_rows(numbered_rows("rollout_sites", 1500));
        source.timeout_always_at.insert(1000);
        let target = MockTarget::with_columns("rollout_sites", &["site_id", "status"]);
        target.set_count(40);
        let settings = settings();
        let migrator = Migrator::new(&source, &target, &settings);

        // Both tables read from the same mock; the timeout hits page two of
        // each, but the second table's schema is missing anyway.
        let summary = migrator
            .run(&[TableKind::RolloutSites, TableKind::SiteScores], false)
            .await
            .unwrap();
        assert_eq!(summary.status, RunStatus::Partial);
        assert_eq!(summary.outcomes.len(), 2);
        assert!(!summary.outcomes[0].success);
    }

    #[tokio::test]
    async fn lenient_verification_accepts_undercounts() {
        let source = MockSource::with_rows(numbered_rows("rollout_sites", 100));
        let target = MockTarget::with_columns("rollout_sites", &["site_id", "status"]);
        target.set_count(60);
        let settings = settings();
        let migrator = Migrator::new(&source, &target, &settings);

        let outcome = migrator.migrate_table(TableKind::RolloutSites, false).await;
        assert!(outcome.success, "lenient mode tolerates undercounts");
    }

    #[tokio::test]
    async fn strict_verification_rejects_undercounts() {
        let source = MockSource::with_rows(numbered_rows("rollout_sites", 100));
        let target = MockTarget::with_columns("rollout_sites", &["site_id", "status"]);
        target.set_count(60);
        let mut strict = settings();
        strict.strict_verify = true;
        let migrator = Migrator::new(&source, &target, &strict);

        let outcome = migrator.migrate_table(TableKind::RolloutSites, false).await;
        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("verification failed"));
    }

    #[tokio::test]
    async fn empty_source_with_empty_target_succeeds() {
        let source = MockSource::with_rows(vec![]);
        let target = MockTarget::with_columns("rollout_sites", &["site_id"]);
        let settings = settings();
        let migrator = Migrator::new(&source, &target, &settings);

        let outcome = migrator.migrate_table(TableKind::RolloutSites, false).await;
        assert!(outcome.success);
        assert_eq!(outcome.source_rows, 0);
    }

    #[tokio::test]
    async fn reload_uses_best_effort_writes() {
        let source = MockSource::with_rows(numbered_rows("rollout_sites", 150));
        let target = MockTarget::with_columns("rollout_sites", &["site_id", "status"]);
        target.set_count(150);

        let outcome = reload_table(&source, &target, &settings(), TableKind::RolloutSites).await;
        assert!(outcome.success);
        assert_eq!(target.deletes.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(target.executed_sql().iter().all(|s| !s.contains("ON CONFLICT")));
        assert_eq!(target.begins.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
