use crate::core::value::Value;
use serde::{Deserialize, Serialize};

/// A named field within a row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

/// One row read from either store, with no enforced schema.
///
/// Field order follows the order the store returned; lookups are
/// case-insensitive because the source and target catalogs do not agree
/// on casing for every table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub table: String,
    pub fields: Vec<FieldValue>,
}

impl RowData {
    pub fn new(table: &str, fields: Vec<FieldValue>) -> Self {
        RowData {
            table: table.to_string(),
            fields,
        }
    }

    /// Builds a row from a decoded JSON object, preserving field order.
    pub fn from_json_object(table: &str, object: serde_json::Map<String, serde_json::Value>) -> Self {
        let fields = object
            .into_iter()
            .map(|(name, value)| FieldValue {
                name,
                value: Value::from_json(value),
            })
            .collect();
        RowData::new(table, fields)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field).map(|f| f.value.clone()).unwrap_or(Value::Null)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.get(field).is_some()
    }
}
