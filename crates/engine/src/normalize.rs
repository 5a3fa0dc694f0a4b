//! Per-row type coercion and column-set projection. Pure functions, no
//! I/O; this is the single place where the source's unknown shape is
//! asserted against the target schema.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::{
    core::value::Value,
    records::row::{FieldValue, RowData},
};

/// Whether a field name marks a date/time-like column.
pub fn is_temporal_field(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("date") || lower.contains("time")
}

/// Parses a calendar date or datetime and renders it canonically:
/// RFC 3339 in UTC for datetimes, plain `YYYY-MM-DD` for bare dates.
/// Returns `None` when the value is not a recognizable temporal.
pub fn canonicalize_temporal(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc).to_rfc3339());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc().to_rfc3339());
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    None
}

fn normalize_field(field: FieldValue) -> FieldValue {
    let FieldValue { name, value } = field;
    let value = match value {
        Value::Null => Value::Null,
        Value::String(s) if is_temporal_field(&name) => {
            if s.trim().is_empty() {
                Value::Null
            } else {
                match canonicalize_temporal(&s) {
                    Some(canonical) => Value::String(canonical),
                    // Unparseable stays untouched rather than guessing.
                    None => Value::String(s),
                }
            }
        }
        v @ (Value::Int(_) | Value::Float(_) | Value::Boolean(_) | Value::String(_)) => v,
        // Nested structures are stringified; the writer only ever sees
        // scalars.
        Value::Json(v) => Value::String(v.to_string()),
    };
    FieldValue { name, value }
}

/// Applies the per-field coercion rules to every row.
pub fn normalize_rows(rows: Vec<RowData>) -> Vec<RowData> {
    rows.into_iter()
        .map(|row| RowData {
            table: row.table,
            fields: row.fields.into_iter().map(normalize_field).collect(),
        })
        .collect()
}

/// Filters a row down to the target schema's columns. Source-only columns
/// are silently dropped; a row intersecting nothing keeps zero fields but
/// still counts as processed.
pub fn project_to_schema(row: RowData, target_columns: &[String]) -> RowData {
    let fields = row
        .fields
        .into_iter()
        .filter(|f| {
            target_columns
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&f.name))
        })
        .collect();
    RowData {
        table: row.table,
        fields,
    }
}
