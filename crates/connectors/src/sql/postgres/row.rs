use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::{
    core::value::Value,
    records::row::{FieldValue, RowData},
};
use tokio_postgres::{types::Type, Row};
use tracing::warn;

/// Maps a Postgres row into the engine's schema-less record shape.
///
/// Only used by diagnostics reads; the write path never round-trips rows
/// through the target.
pub fn row_to_row_data(table: &str, row: &Row) -> RowData {
    let fields = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| FieldValue {
            name: column.name().to_string(),
            value: read_value(row, idx, column.type_()),
        })
        .collect();
    RowData::new(table, fields)
}

fn read_value(row: &Row, idx: usize, ty: &Type) -> Value {
    match ty.name() {
        "int2" => opt(row.try_get::<_, Option<i16>>(idx)).map_or(Value::Null, |v| {
            Value::Int(v as i64)
        }),
        "int4" => opt(row.try_get::<_, Option<i32>>(idx)).map_or(Value::Null, |v| {
            Value::Int(v as i64)
        }),
        "int8" => opt(row.try_get::<_, Option<i64>>(idx)).map_or(Value::Null, Value::Int),
        "float4" => opt(row.try_get::<_, Option<f32>>(idx)).map_or(Value::Null, |v| {
            Value::Float(v as f64)
        }),
        "float8" => opt(row.try_get::<_, Option<f64>>(idx)).map_or(Value::Null, Value::Float),
        "numeric" => opt(row.try_get::<_, Option<rust_decimal::Decimal>>(idx))
            .map_or(Value::Null, |v| Value::String(v.to_string())),
        "bool" => opt(row.try_get::<_, Option<bool>>(idx)).map_or(Value::Null, Value::Boolean),
        "json" | "jsonb" => opt(row.try_get::<_, Option<serde_json::Value>>(idx))
            .map_or(Value::Null, Value::Json),
        "uuid" => opt(row.try_get::<_, Option<uuid::Uuid>>(idx))
            .map_or(Value::Null, |v| Value::String(v.to_string())),
        "date" => opt(row.try_get::<_, Option<NaiveDate>>(idx))
            .map_or(Value::Null, |v| Value::String(v.format("%Y-%m-%d").to_string())),
        "timestamp" => opt(row.try_get::<_, Option<NaiveDateTime>>(idx))
            .map_or(Value::Null, |v| Value::String(v.and_utc().to_rfc3339())),
        "timestamptz" => opt(row.try_get::<_, Option<DateTime<Utc>>>(idx))
            .map_or(Value::Null, |v| Value::String(v.to_rfc3339())),
        _ => match row.try_get::<_, Option<String>>(idx) {
            Ok(Some(v)) => Value::String(v),
            Ok(None) => Value::Null,
            Err(_) => {
                warn!(column = idx, pg_type = %ty, "unreadable column in sample row");
                Value::Null
            }
        },
    }
}

fn opt<T>(result: Result<Option<T>, tokio_postgres::Error>) -> Option<T> {
    result.ok().flatten()
}
