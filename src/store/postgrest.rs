//! PostgREST-compatible HTTP store, e.g. a hosted Postgres with a REST gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use super::RemoteStore;
use crate::errors::{StoreError, StoreErrorKind};
use crate::identity::OwnerId;
use crate::normalize::RawRow;

/// Application rows behind a `/rest/v1/{table}` endpoint.
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    table_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        table: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, StoreError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            table_url: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key: api_key.into(),
        })
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.table_url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

/// Map a non-success HTTP status to a store error category.
pub fn classify_status(status: StatusCode) -> StoreErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreErrorKind::Auth,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreErrorKind::Validation
        }
        _ => StoreErrorKind::Query,
    }
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    // PostgREST reports failures as {"code", "message", "details", "hint"}.
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);

    tracing::warn!("Remote store answered {}: {}", status, message);
    Err(StoreError::new(
        classify_status(status),
        format!("{}: {}", status, message),
    ))
}

#[async_trait]
impl RemoteStore for PostgrestStore {
    async fn list_all(&self, owner: &OwnerId) -> Result<Vec<RawRow>, StoreError> {
        let owner_filter = format!("eq.{}", owner);
        let response = self
            .request(Method::GET)
            .query(&[
                ("select", "*"),
                ("user_id", owner_filter.as_str()),
                ("order", "created_at.desc"),
            ])
            .send()
            .await?;

        Ok(check(response).await?.json::<Vec<RawRow>>().await?)
    }

    async fn insert(&self, row: RawRow) -> Result<RawRow, StoreError> {
        let response = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        check(response)
            .await?
            .json::<Vec<RawRow>>()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::decode("insert returned no row"))
    }

    async fn update(&self, id: &str, patch: RawRow) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }

        let id_filter = format!("eq.{}", id);
        let response = self
            .request(Method::PATCH)
            .header("Prefer", "return=minimal")
            .query(&[("id", id_filter.as_str())])
            .json(&patch)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id_filter = format!("eq.{}", id);
        let response = self
            .request(Method::DELETE)
            .query(&[("id", id_filter.as_str())])
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }
}
