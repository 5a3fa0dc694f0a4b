use crate::write::ident::quote_ident;
use model::{core::value::Value, records::row::RowData};

/// One multi-row insert, rendered with positional parameters only.
#[derive(Debug)]
pub struct InsertStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// The subset of target columns present in at least one row of the batch,
/// in target-schema order. Empty when no row intersects the schema.
pub fn effective_columns(target_columns: &[String], rows: &[RowData]) -> Vec<String> {
    target_columns
        .iter()
        .filter(|column| rows.iter().any(|row| row.has_field(column)))
        .cloned()
        .collect()
}

/// Builds `INSERT INTO t (cols) VALUES ($1,…),(…)` over the effective
/// column set, with `NULL` bound for fields a row is missing.
///
/// With `upsert` set, a uniqueness conflict on the natural key overwrites
/// every non-key column with the incoming value, which is what makes
/// re-runs idempotent. A key-only column set degrades to `DO NOTHING`.
pub fn build_batch_insert(
    table: &str,
    natural_key: &str,
    columns: &[String],
    rows: &[RowData],
    upsert: bool,
) -> InsertStatement {
    let quoted_columns = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>();

    let mut params = Vec::with_capacity(rows.len() * columns.len());
    let mut groups = Vec::with_capacity(rows.len());
    let mut placeholder = 1usize;
    for row in rows {
        let group = columns
            .iter()
            .map(|column| {
                params.push(row.get_value(column));
                let p = format!("${placeholder}");
                placeholder += 1;
                p
            })
            .collect::<Vec<_>>()
            .join(", ");
        groups.push(format!("({group})"));
    }

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        quoted_columns.join(", "),
        groups.join(", ")
    );

    if upsert {
        let assignments = columns
            .iter()
            .filter(|c| !c.eq_ignore_ascii_case(natural_key))
            .map(|c| {
                let quoted = quote_ident(c);
                format!("{quoted} = EXCLUDED.{quoted}")
            })
            .collect::<Vec<_>>();

        if assignments.is_empty() {
            sql.push_str(&format!(
                " ON CONFLICT ({}) DO NOTHING",
                quote_ident(natural_key)
            ));
        } else {
            sql.push_str(&format!(
                " ON CONFLICT ({}) DO UPDATE SET {}",
                quote_ident(natural_key),
                assignments.join(", ")
            ));
        }
    }

    InsertStatement { sql, params }
}
