//! Hand-written mock stores shared by the engine's unit tests.

use async_trait::async_trait;
use connectors::{
    error::{DbError, SourceError},
    source::SourceReader,
    sql::TargetStore,
};
use model::{
    core::value::Value,
    records::row::{FieldValue, RowData},
};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

/// Builds a row with a `site_id` key plus arbitrary extra fields.
pub fn site_row(table: &str, site_id: &str, extra: &[(&str, Value)]) -> RowData {
    let mut fields = vec![FieldValue {
        name: "site_id".into(),
        value: Value::String(site_id.into()),
    }];
    for (name, value) in extra {
        fields.push(FieldValue {
            name: (*name).into(),
            value: value.clone(),
        });
    }
    RowData::new(table, fields)
}

/// Generates `n` sequential rows keyed `NR-0000`, `NR-0001`, …
pub fn numbered_rows(table: &str, n: usize) -> Vec<RowData> {
    (0..n)
        .map(|i| {
            site_row(
                table,
                &format!("NR-{i:04}"),
                &[("status", Value::String("on_air".into()))],
            )
        })
        .collect()
}

#[derive(Default)]
pub struct MockSource {
    pub rows: Vec<RowData>,
    /// Offsets that time out exactly once, then succeed.
    pub timeout_once_at: Mutex<HashSet<usize>>,
    /// Offsets that always time out.
    pub timeout_always_at: HashSet<usize>,
    /// Offsets that fail hard (non-timeout).
    pub fail_hard_at: HashSet<usize>,
    /// Every `(offset, limit)` pair requested, in order.
    pub calls: Mutex<Vec<(usize, usize)>>,
    pub ping_ok: bool,
}

impl MockSource {
    pub fn with_rows(rows: Vec<RowData>) -> Self {
        MockSource {
            rows,
            ping_ok: true,
            ..Default::default()
        }
    }

    pub fn call_log(&self) -> Vec<(usize, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceReader for MockSource {
    async fn ping(&self) -> Result<(), SourceError> {
        if self.ping_ok {
            Ok(())
        } else {
            Err(SourceError::Http("connection refused".into()))
        }
    }

    async fn fetch_range(
        &self,
        _table: &str,
        _order_key: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RowData>, SourceError> {
        self.calls.lock().unwrap().push((offset, limit));

        if self.timeout_always_at.contains(&offset) {
            return Err(SourceError::Timeout("statement deadline".into()));
        }
        if self.timeout_once_at.lock().unwrap().remove(&offset) {
            return Err(SourceError::Timeout("statement deadline".into()));
        }
        if self.fail_hard_at.contains(&offset) {
            return Err(SourceError::Http("connection reset".into()));
        }

        let end = (offset + limit).min(self.rows.len());
        if offset >= self.rows.len() {
            return Ok(vec![]);
        }
        Ok(self.rows[offset..end].to_vec())
    }

    async fn fetch_filtered(
        &self,
        _table: &str,
        filter: Option<(&str, &str)>,
        limit: usize,
    ) -> Result<Vec<RowData>, SourceError> {
        let rows = self
            .rows
            .iter()
            .filter(|row| match filter {
                Some((column, value)) => {
                    row.get_value(column).as_string().as_deref() == Some(value)
                }
                None => true,
            })
            .take(limit)
            .cloned()
            .collect();
        Ok(rows)
    }
}

#[derive(Default)]
pub struct MockTarget {
    pub columns: HashMap<String, Vec<String>>,
    /// 1-based indexes of `execute` calls that fail.
    pub fail_execute_calls: HashSet<usize>,
    pub fail_delete: bool,
    pub ping_ok: bool,
    pub count_value: Mutex<i64>,
    pub sample: Vec<RowData>,

    /// When set, `execute` interprets the statements it receives and keeps
    /// rows keyed by this column, so upsert-vs-duplicate behavior is
    /// observable across runs. `count` then reports the stored row count.
    pub key_column: Option<String>,
    pub stored: Mutex<BTreeMap<String, usize>>,

    pub execute_seq: AtomicUsize,
    pub executed: Mutex<Vec<(String, Vec<Value>)>>,
    pub begins: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl MockTarget {
    pub fn with_columns(table: &str, columns: &[&str]) -> Self {
        let mut map = HashMap::new();
        map.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        MockTarget {
            columns: map,
            ping_ok: true,
            ..Default::default()
        }
    }

    /// Like [`MockTarget::with_columns`], but written rows are stored under
    /// `key` with real conflict semantics.
    pub fn with_tracked_rows(table: &str, columns: &[&str], key: &str) -> Self {
        let mut target = Self::with_columns(table, columns);
        target.key_column = Some(key.to_string());
        target
    }

    pub fn set_count(&self, count: i64) {
        *self.count_value.lock().unwrap() = count;
    }

    fn apply_statement(&self, sql: &str, params: &[Value], key: &str) {
        let columns = statement_columns(sql);
        let Some(key_idx) = columns.iter().position(|c| c.eq_ignore_ascii_case(key)) else {
            return;
        };
        let upsert = sql.contains("ON CONFLICT");
        let mut stored = self.stored.lock().unwrap();
        for group in params.chunks(columns.len()) {
            let key_value = group[key_idx].to_string();
            if upsert {
                // Conflict on the key overwrites; DO NOTHING also never
                // duplicates.
                stored.insert(key_value, 1);
            } else {
                *stored.entry(key_value).or_insert(0) += 1;
            }
        }
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }
}

#[async_trait]
impl TargetStore for MockTarget {
    async fn ping(&self) -> Result<(), DbError> {
        if self.ping_ok {
            Ok(())
        } else {
            Err(DbError::Unknown("target unreachable".into()))
        }
    }

    async fn columns(&self, table: &str) -> Result<Vec<String>, DbError> {
        Ok(self.columns.get(table).cloned().unwrap_or_default())
    }

    async fn count(&self, _table: &str) -> Result<i64, DbError> {
        if self.key_column.is_some() {
            return Ok(self.stored.lock().unwrap().values().sum::<usize>() as i64);
        }
        Ok(*self.count_value.lock().unwrap())
    }

    async fn delete_all(&self, _table: &str) -> Result<u64, DbError> {
        if self.fail_delete {
            return Err(DbError::Write("delete rejected".into()));
        }
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut stored = self.stored.lock().unwrap();
        let removed = stored.values().sum::<usize>() as u64;
        stored.clear();
        Ok(removed)
    }

    async fn begin(&self) -> Result<(), DbError> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn commit(&self) -> Result<(), DbError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DbError> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, DbError> {
        let call = self.execute_seq.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_execute_calls.contains(&call) {
            return Err(DbError::Write(format!("duplicate key (call {call})")));
        }
        if let Some(key) = self.key_column.clone() {
            self.apply_statement(sql, &params, &key);
        }
        let rows = params.len() as u64;
        self.executed.lock().unwrap().push((sql.to_string(), params));
        Ok(rows)
    }

    async fn fetch_sample(&self, _table: &str, limit: usize) -> Result<Vec<RowData>, DbError> {
        Ok(self.sample.iter().take(limit).cloned().collect())
    }
}

/// Column list of an `INSERT INTO t (a, b, ...) VALUES ...` statement.
fn statement_columns(sql: &str) -> Vec<String> {
    let Some(start) = sql.find('(') else {
        return Vec::new();
    };
    let Some(end) = sql[start..].find(')') else {
        return Vec::new();
    };
    sql[start + 1..start + end]
        .split(',')
        .map(|c| c.trim().trim_matches('"').to_string())
        .collect()
}
