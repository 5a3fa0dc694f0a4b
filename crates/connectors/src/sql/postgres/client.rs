use crate::{
    error::{ConnectorError, DbError},
    sql::{
        postgres::{params::PgValue, row::row_to_row_data},
        TargetStore,
    },
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::RowData};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error};

const QUERY_COLUMNS_SQL: &str = "SELECT column_name \
     FROM information_schema.columns \
     WHERE table_schema = 'public' AND table_name = $1 \
     ORDER BY ordinal_position";

/// Connection handle to the locally managed Postgres database.
///
/// Constructed once at process start and passed by reference into the
/// engine; holds a single connection used strictly sequentially, which is
/// what lets transactions be driven with plain BEGIN/COMMIT/ROLLBACK.
#[derive(Clone)]
pub struct PgTarget {
    client: Arc<RwLock<Client>>,
}

impl PgTarget {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let (client, connection) = tokio_postgres::connect(url, NoTls).await?;

        // The connection object drives the socket; it lives until the
        // client is dropped.
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                error!(error = %err, "target connection terminated");
            }
        });

        Ok(PgTarget {
            client: Arc::new(RwLock::new(client)),
        })
    }

    /// Quotes a table name for use in statements assembled here. Table
    /// names come from the fixed `TableKind` set, but diagnostics accept
    /// caller-provided names too.
    fn quoted(table: &str) -> String {
        format!("\"{}\"", table.replace('"', "\"\""))
    }
}

#[async_trait]
impl TargetStore for PgTarget {
    async fn ping(&self) -> Result<(), DbError> {
        let client = self.client.read().await;
        client.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    async fn columns(&self, table: &str) -> Result<Vec<String>, DbError> {
        let client = self.client.read().await;
        let rows = client.query(QUERY_COLUMNS_SQL, &[&table]).await?;
        let columns = rows
            .iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(table, count = columns.len(), "introspected target columns");
        Ok(columns)
    }

    async fn count(&self, table: &str) -> Result<i64, DbError> {
        let client = self.client.read().await;
        let sql = format!("SELECT COUNT(*) FROM {}", Self::quoted(table));
        let row = client.query_one(&sql, &[]).await?;
        Ok(row.try_get(0)?)
    }

    async fn delete_all(&self, table: &str) -> Result<u64, DbError> {
        let client = self.client.write().await;
        let sql = format!("DELETE FROM {}", Self::quoted(table));
        Ok(client.execute(&sql, &[]).await?)
    }

    async fn begin(&self) -> Result<(), DbError> {
        let client = self.client.write().await;
        client.batch_execute("BEGIN").await?;
        Ok(())
    }

    async fn commit(&self) -> Result<(), DbError> {
        let client = self.client.write().await;
        client.batch_execute("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DbError> {
        let client = self.client.write().await;
        client.batch_execute("ROLLBACK").await?;
        Ok(())
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, DbError> {
        let bindings = PgValue::from_values(params);
        let refs = PgValue::as_refs(&bindings);
        let client = self.client.write().await;
        Ok(client.execute(sql, &refs).await?)
    }

    async fn fetch_sample(&self, table: &str, limit: usize) -> Result<Vec<RowData>, DbError> {
        let client = self.client.read().await;
        let sql = format!("SELECT * FROM {} LIMIT {limit}", Self::quoted(table));
        let rows = client.query(&sql, &[]).await?;
        Ok(rows.iter().map(|row| row_to_row_data(table, row)).collect())
    }
}
