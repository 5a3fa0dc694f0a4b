use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::core::value::Value;
use rust_decimal::Decimal;
use std::error::Error;
use std::str::FromStr;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};

type BoxError = Box<dyn Error + Sync + Send>;

/// Binds a schema-less [`Value`] as a statement parameter.
///
/// The source store hands us JSON scalars with no type information, while
/// the prepared statement knows the exact wire type of every column. The
/// usual `ToSql` impls refuse that mismatch (a JSON integer arrives as
/// `i64`, which plain `i64::accepts` rejects for an `int4` column), so this
/// wrapper accepts every type and coerces the value to whatever the
/// statement asks for. Coercion failures surface as batch write errors.
#[derive(Debug)]
pub struct PgValue(pub Value);

impl PgValue {
    pub fn from_values(values: Vec<Value>) -> Vec<PgValue> {
        values.into_iter().map(PgValue).collect()
    }

    pub fn as_refs(params: &[PgValue]) -> Vec<&(dyn ToSql + Sync)> {
        params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }
}

impl ToSql for PgValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if self.0.is_null() {
            return Ok(IsNull::Yes);
        }

        // `Type` constants cannot appear in patterns, so dispatch on the
        // catalog name instead.
        match ty.name() {
            "int2" => (coerce_i64(&self.0, ty)? as i16).to_sql(ty, out),
            "int4" => (coerce_i64(&self.0, ty)? as i32).to_sql(ty, out),
            "int8" => coerce_i64(&self.0, ty)?.to_sql(ty, out),
            "float4" => (coerce_f64(&self.0, ty)? as f32).to_sql(ty, out),
            "float8" => coerce_f64(&self.0, ty)?.to_sql(ty, out),
            "numeric" => coerce_decimal(&self.0, ty)?.to_sql(ty, out),
            "bool" => coerce_bool(&self.0, ty)?.to_sql(ty, out),
            "date" => coerce_date(&self.0, ty)?.to_sql(ty, out),
            "timestamp" => coerce_naive_datetime(&self.0, ty)?.to_sql(ty, out),
            "timestamptz" => coerce_datetime_utc(&self.0, ty)?.to_sql(ty, out),
            "json" | "jsonb" => coerce_json(&self.0).to_sql(ty, out),
            "uuid" => coerce_uuid(&self.0, ty)?.to_sql(ty, out),
            // Text-like columns, and anything exotic (domains, enums):
            // the text representation is what the source had anyway.
            _ => coerce_string(&self.0).to_sql(&Type::TEXT, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn mismatch(value: &Value, ty: &Type) -> BoxError {
    format!("cannot coerce {value:?} to {ty}").into()
}

fn coerce_string(value: &Value) -> String {
    value.as_string().unwrap_or_default()
}

fn coerce_i64(value: &Value, ty: &Type) -> Result<i64, BoxError> {
    match value {
        Value::Int(v) => Ok(*v),
        Value::Float(v) if v.fract() == 0.0 => Ok(*v as i64),
        Value::Boolean(v) => Ok(i64::from(*v)),
        Value::String(s) => s.trim().parse().map_err(|_| mismatch(value, ty)),
        _ => Err(mismatch(value, ty)),
    }
}

fn coerce_f64(value: &Value, ty: &Type) -> Result<f64, BoxError> {
    match value {
        Value::Int(v) => Ok(*v as f64),
        Value::Float(v) => Ok(*v),
        Value::String(s) => s.trim().parse().map_err(|_| mismatch(value, ty)),
        _ => Err(mismatch(value, ty)),
    }
}

fn coerce_decimal(value: &Value, ty: &Type) -> Result<Decimal, BoxError> {
    match value {
        Value::Int(v) => Ok(Decimal::from(*v)),
        Value::Float(v) => Decimal::from_str(&v.to_string()).map_err(|_| mismatch(value, ty)),
        Value::String(s) => Decimal::from_str(s.trim()).map_err(|_| mismatch(value, ty)),
        _ => Err(mismatch(value, ty)),
    }
}

fn coerce_bool(value: &Value, ty: &Type) -> Result<bool, BoxError> {
    match value {
        Value::Boolean(v) => Ok(*v),
        Value::Int(v) => Ok(*v != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" => Ok(true),
            "false" | "f" | "0" | "no" => Ok(false),
            _ => Err(mismatch(value, ty)),
        },
        _ => Err(mismatch(value, ty)),
    }
}

fn coerce_date(value: &Value, ty: &Type) -> Result<NaiveDate, BoxError> {
    let Value::String(s) = value else {
        return Err(mismatch(value, ty));
    };
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
        .map_err(|_| mismatch(value, ty))
}

fn coerce_naive_datetime(value: &Value, ty: &Type) -> Result<NaiveDateTime, BoxError> {
    coerce_datetime_utc(value, ty).map(|dt| dt.naive_utc())
}

fn coerce_datetime_utc(value: &Value, ty: &Type) -> Result<DateTime<Utc>, BoxError> {
    let Value::String(s) = value else {
        return Err(mismatch(value, ty));
    };
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(mismatch(value, ty))
}

fn coerce_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Json(v) => v.clone(),
        Value::String(s) => {
            serde_json::from_str(s).unwrap_or(serde_json::Value::String(s.clone()))
        }
        Value::Int(v) => serde_json::Value::from(*v),
        Value::Float(v) => serde_json::Value::from(*v),
        Value::Boolean(v) => serde_json::Value::from(*v),
        Value::Null => serde_json::Value::Null,
    }
}

fn coerce_uuid(value: &Value, ty: &Type) -> Result<uuid::Uuid, BoxError> {
    match value {
        Value::String(s) => uuid::Uuid::parse_str(s.trim()).map_err(|_| mismatch(value, ty)),
        _ => Err(mismatch(value, ty)),
    }
}
