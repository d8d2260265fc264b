//! HTTP backend for the hosted data service
//!
//! Speaks the backend's PostgREST-style conventions: one REST resource per
//! table, filters and ranges as query parameters, embedded child rows via
//! the `select` parameter, and `Prefer: return=representation` so writes
//! echo the stored row back.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::query::SelectQuery;
use crate::RemoteStore;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    rest_path: String,
    api_key: Option<String>,
    token: Option<String>,
}

impl HttpStore {
    /// Create a new HTTP store from configuration.
    pub fn new(config: &StoreConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.clone(),
            rest_path: config.rest_path.clone(),
            api_key: config.api_key.clone(),
            token: config.token.clone(),
        }
    }

    /// Replace the per-user bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn endpoint(&self, table: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.rest_path.trim_matches('/'),
            table
        )
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let mut request = self.client.request(method, self.endpoint(table));
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }
        if let Some(bearer) = self.token.as_ref().or(self.api_key.as_ref()) {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Bearer {bearer}"));
        }
        request
    }

    /// A write request that asks the backend to echo the stored rows.
    fn write_request(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, table)
            .header("Prefer", "return=representation")
    }

    async fn read_rows(response: reqwest::Response) -> StoreResult<Vec<Value>> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %text, "backend rejected request");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    StoreError::PermissionDenied(text)
                }
                StatusCode::NOT_FOUND => StoreError::NotFound(text),
                StatusCode::CONFLICT => StoreError::Conflict(text),
                _ => StoreError::Backend(text),
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        response.json().await.map_err(Into::into)
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn insert(&self, table: &str, row: Value) -> StoreResult<Value> {
        tracing::debug!(table, "insert");
        let response = self.write_request(Method::POST, table).json(&row).send().await?;
        let mut rows = Self::read_rows(response).await?;
        if rows.is_empty() {
            return Err(StoreError::InvalidResponse(format!(
                "insert into {table} returned no representation"
            )));
        }
        Ok(rows.remove(0))
    }

    async fn insert_many(&self, table: &str, rows: Vec<Value>) -> StoreResult<Vec<Value>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .write_request(Method::POST, table)
            .json(&Value::Array(rows))
            .send()
            .await?;
        Self::read_rows(response).await
    }

    async fn update_by_id(&self, table: &str, id: Uuid, patch: Value) -> StoreResult<Value> {
        let response = self
            .write_request(Method::PATCH, table)
            .query(&[("id", format!("eq.{id}"))])
            .json(&patch)
            .send()
            .await?;
        let mut rows = Self::read_rows(response).await?;
        if rows.is_empty() {
            // The backend answers an empty representation when the filter
            // matched no row
            return Err(StoreError::NotFound(format!("{table} row {id}")));
        }
        Ok(rows.remove(0))
    }

    async fn delete_by_id(&self, table: &str, id: Uuid) -> StoreResult<()> {
        let response = self
            .write_request(Method::DELETE, table)
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;
        let rows = Self::read_rows(response).await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(format!("{table} row {id}")));
        }
        Ok(())
    }

    async fn delete_matching(&self, table: &str, column: &str, value: Value) -> StoreResult<()> {
        let rendered = match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let response = self
            .request(Method::DELETE, table)
            .query(&[(column, format!("eq.{rendered}"))])
            .send()
            .await?;
        Self::read_rows(response).await?;
        Ok(())
    }

    async fn select(&self, table: &str, query: SelectQuery) -> StoreResult<Vec<Value>> {
        tracing::debug!(table, ?query, "select");
        let response = self
            .request(Method::GET, table)
            .query(&query.to_query_pairs())
            .send()
            .await?;
        Self::read_rows(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_rest_path() {
        let store = StoreConfig::new("https://example.test/")
            .with_rest_path("/rest/v1/")
            .build_http_store();
        assert_eq!(
            store.endpoint("services"),
            "https://example.test/rest/v1/services"
        );
    }
}
