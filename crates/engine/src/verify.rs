//! Read-only comparison utilities for post-migration diagnostics. These
//! never mutate either store and are not part of the write path.

use crate::error::EngineError;
use connectors::{source::SourceReader, sql::TargetStore};
use model::{core::value::Value, records::row::RowData, table::TableKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column-name symmetric difference between a source sample and the
/// target catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureDiff {
    pub table: TableKind,
    pub only_in_source: Vec<String>,
    pub only_in_target: Vec<String>,
    pub shared: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffKind {
    Match,
    /// Both sides have the record but the named fields disagree.
    DifferentKeys { fields: Vec<String> },
    MissingInSource,
    MissingInTarget,
}

/// One compared record pair, keyed by the table's natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleDiff {
    pub key: String,
    #[serde(flatten)]
    pub kind: DiffKind,
}

/// Compares the source's observed column set (union over a small sample)
/// with the target catalog.
pub async fn compare_structure(
    source: &dyn SourceReader,
    target: &dyn TargetStore,
    table: TableKind,
    sample_limit: usize,
) -> Result<StructureDiff, EngineError> {
    let name = table.table_name();
    let sample = source.fetch_filtered(name, None, sample_limit).await?;
    let target_columns = target.columns(name).await?;

    let mut source_columns: Vec<String> = Vec::new();
    for row in &sample {
        for field in &row.field_names() {
            if !source_columns.iter().any(|c| c.eq_ignore_ascii_case(field)) {
                source_columns.push(field.clone());
            }
        }
    }

    let only_in_source = source_columns
        .iter()
        .filter(|c| !target_columns.iter().any(|t| t.eq_ignore_ascii_case(c)))
        .cloned()
        .collect();
    let only_in_target = target_columns
        .iter()
        .filter(|c| !source_columns.iter().any(|s| s.eq_ignore_ascii_case(c)))
        .cloned()
        .collect();
    let shared = source_columns
        .iter()
        .filter(|c| target_columns.iter().any(|t| t.eq_ignore_ascii_case(c)))
        .cloned()
        .collect();

    Ok(StructureDiff {
        table,
        only_in_source,
        only_in_target,
        shared,
    })
}

/// Field-by-field sample comparison keyed by natural key. `program_filter`
/// restricts the source sample to one rollout program.
pub async fn compare_samples(
    source: &dyn SourceReader,
    target: &dyn TargetStore,
    table: TableKind,
    limit: usize,
    program_filter: Option<&str>,
) -> Result<Vec<SampleDiff>, EngineError> {
    let name = table.table_name();
    let key_column = table.natural_key();

    let filter = program_filter.map(|value| ("program", value));
    let source_rows = source.fetch_filtered(name, filter, limit).await?;
    let target_rows = target.fetch_sample(name, limit).await?;

    let source_index = index_by_key(&source_rows, key_column);
    let target_index = index_by_key(&target_rows, key_column);

    let mut keys: Vec<&String> = source_index.keys().chain(target_index.keys()).collect();
    keys.sort();
    keys.dedup();

    let diffs = keys
        .into_iter()
        .map(|key| {
            let kind = match (source_index.get(key), target_index.get(key)) {
                (Some(src), Some(tgt)) => {
                    let fields = differing_fields(src, tgt);
                    if fields.is_empty() {
                        DiffKind::Match
                    } else {
                        DiffKind::DifferentKeys { fields }
                    }
                }
                (None, Some(_)) => DiffKind::MissingInSource,
                (Some(_), None) => DiffKind::MissingInTarget,
                (None, None) => unreachable!("key came from one of the indexes"),
            };
            SampleDiff {
                key: key.clone(),
                kind,
            }
        })
        .collect();

    Ok(diffs)
}

fn index_by_key<'a>(rows: &'a [RowData], key_column: &str) -> BTreeMap<String, &'a RowData> {
    rows.iter()
        .filter_map(|row| {
            row.get_value(key_column)
                .as_string()
                .map(|key| (key, row))
        })
        .collect()
}

/// Shared fields whose values disagree, compared loosely on the string
/// rendering so `1` and `"1"` or differently typed timestamps line up.
fn differing_fields(source: &RowData, target: &RowData) -> Vec<String> {
    source
        .fields
        .iter()
        .filter(|field| target.has_field(&field.name))
        .filter(|field| {
            let target_value = target.get_value(&field.name);
            !loosely_equal(&field.value, &target_value)
        })
        .map(|field| field.name.clone())
        .collect()
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        _ => a.as_string() == b.as_string(),
    }
}
