use crate::{error::SourceError, source::SourceReader};
use async_trait::async_trait;
use model::records::row::RowData;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::time::Duration;
use tracing::debug;

/// Client for the hosted, PostgREST-style query backend the dashboard
/// reads from. Rows come back as JSON arrays of objects; pagination is
/// plain `offset`/`limit` with an explicit `order` parameter.
#[derive(Clone)]
pub struct RestSource {
    http: reqwest::Client,
    base_url: String,
}

impl RestSource {
    pub fn new(
        base_url: &str,
        api_key: &str,
        request_timeout: Duration,
    ) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| SourceError::Http(format!("invalid api key: {e}")))?;
        headers.insert("apikey", key);
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| SourceError::Http(format!("invalid api key: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .map_err(SourceError::from)?;

        Ok(RestSource {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn fetch(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<Vec<RowData>, SourceError> {
        let response = self.http.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Vec<serde_json::Map<String, serde_json::Value>> = response.json().await?;
        let table = url.rsplit('/').next().unwrap_or_default().to_string();
        Ok(payload
            .into_iter()
            .map(|obj| RowData::from_json_object(&table, obj))
            .collect())
    }
}

#[async_trait]
impl SourceReader for RestSource {
    async fn ping(&self) -> Result<(), SourceError> {
        // HEAD against the API root; any authenticated answer counts.
        let response = self
            .http
            .head(format!("{}/rest/v1/", self.base_url))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SourceError::Status {
                status: status.as_u16(),
                body: String::new(),
            })
        }
    }

    async fn fetch_range(
        &self,
        table: &str,
        order_key: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RowData>, SourceError> {
        debug!(table, offset, limit, order_key, "fetching source page");
        let query = [
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), format!("{order_key}.asc")),
            ("offset".to_string(), offset.to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        self.fetch(&self.table_url(table), &query).await
    }

    async fn fetch_filtered(
        &self,
        table: &str,
        filter: Option<(&str, &str)>,
        limit: usize,
    ) -> Result<Vec<RowData>, SourceError> {
        let mut query = vec![
            ("select".to_string(), "*".to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        if let Some((column, value)) = filter {
            query.push((column.to_string(), format!("eq.{value}")));
        }
        self.fetch(&self.table_url(table), &query).await
    }
}
