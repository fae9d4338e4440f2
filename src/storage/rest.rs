//! PostgREST-style HTTP store, as exposed by hosted Postgres platforms.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::TableStore;
use crate::utilities::config::StoreSettings;
use crate::utilities::errors::StoreError;

/// Longest slice of an error body kept in [`StoreError::Api`].
const MAX_ERROR_BODY: usize = 500;

/// Store client speaking the `/rest/v1/{table}` protocol.
#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    key: String,
    client: reqwest::Client,
}

impl fmt::Debug for RestStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl RestStore {
    pub fn new(settings: &StoreSettings, timeout: Option<Duration>) -> Result<Self, StoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: settings.url.trim_end_matches('/').to_string(),
            key: settings.key.clone(),
            client: builder.build()?,
        })
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "return=representation")
    }

    async fn rows(response: reqwest::Response) -> Result<Vec<Value>, StoreError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Array(rows)) => Ok(rows),
            Ok(row @ Value::Object(_)) => Ok(vec![row]),
            Ok(other) => Err(StoreError::Decode(format!("expected row list, got {other}"))),
            Err(e) => Err(StoreError::Decode(e.to_string())),
        }
    }
}

/// Render an equality filter value the way PostgREST expects it in a query.
fn filter_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TableStore for RestStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError> {
        log::debug!("POST {}", self.table_url(table));
        let response = self
            .request(reqwest::Method::POST, &self.table_url(table))
            .json(&row)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn update_eq(
        &self,
        table: &str,
        column: &str,
        value: &Value,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let url = self.table_url(table);
        let filter = format!("eq.{}", filter_literal(value));
        log::debug!("PATCH {url}?{column}={filter}");
        let response = self
            .request(reqwest::Method::PATCH, &url)
            .query(&[(column, filter.as_str())])
            .json(&patch)
            .send()
            .await?;
        Self::rows(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, Method, StatusCode};
    use axum::routing::any;
    use axum::{Json, Router};
    use serde_json::json;

    #[derive(Debug, Clone)]
    struct Seen {
        method: Method,
        table: String,
        query: HashMap<String, String>,
        apikey: Option<String>,
        auth: Option<String>,
        prefer: Option<String>,
        body: Value,
    }

    type Log = Arc<Mutex<Vec<Seen>>>;

    async fn handler(
        State(log): State<Log>,
        method: Method,
        Path(table): Path<String>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        log.lock().unwrap().push(Seen {
            method,
            table: table.clone(),
            query,
            apikey: header("apikey"),
            auth: header("authorization"),
            prefer: header("prefer"),
            body: body.clone(),
        });

        if table == "broken" {
            return (
                StatusCode::CONFLICT,
                Json(json!({"message": "duplicate key value"})),
            );
        }
        let mut row = body;
        row["id"] = json!(7);
        (StatusCode::CREATED, Json(json!([row])))
    }

    async fn spawn_mock() -> (String, Log) {
        let log: Log = Arc::default();
        let app = Router::new()
            .route("/rest/v1/:table", any(handler))
            .with_state(log.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/"), log)
    }

    fn store(url: &str) -> RestStore {
        let settings = StoreSettings {
            url: url.to_string(),
            key: "service-key".to_string(),
        };
        RestStore::new(&settings, None).unwrap()
    }

    #[test]
    fn test_table_url_trims_trailing_slash() {
        let store = store("https://project.example.co/");
        assert_eq!(store.table_url("users"), "https://project.example.co/rest/v1/users");
        assert!(!format!("{store:?}").contains("service-key"));
    }

    #[tokio::test]
    async fn test_insert_sends_auth_headers_and_returns_rows() {
        let (url, log) = spawn_mock().await;
        let rows = store(&url)
            .insert("users", json!({"nickname": "민수"}))
            .await
            .unwrap();

        assert_eq!(rows, vec![json!({"nickname": "민수", "id": 7})]);
        let seen = log.lock().unwrap()[0].clone();
        assert_eq!(seen.method, Method::POST);
        assert_eq!(seen.table, "users");
        assert_eq!(seen.apikey.as_deref(), Some("service-key"));
        assert_eq!(seen.auth.as_deref(), Some("Bearer service-key"));
        assert_eq!(seen.prefer.as_deref(), Some("return=representation"));
    }

    #[tokio::test]
    async fn test_update_uses_equality_filter() {
        let (url, log) = spawn_mock().await;
        store(&url)
            .update_eq(
                "game_sessions",
                "session_id",
                &json!(42),
                json!({"final_choice": "EMOTIONAL"}),
            )
            .await
            .unwrap();

        let seen = log.lock().unwrap()[0].clone();
        assert_eq!(seen.method, Method::PATCH);
        assert_eq!(seen.query.get("session_id").map(String::as_str), Some("eq.42"));
        assert_eq!(seen.body, json!({"final_choice": "EMOTIONAL"}));
    }

    #[tokio::test]
    async fn test_rejection_becomes_api_error() {
        let (url, _log) = spawn_mock().await;
        let err = store(&url).insert("broken", json!({})).await.unwrap_err();
        match err {
            StoreError::Api { status, body } => {
                assert_eq!(status, 409);
                assert!(body.contains("duplicate key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_filter_literal() {
        assert_eq!(filter_literal(&json!(5)), "5");
        assert_eq!(filter_literal(&json!("a-b")), "a-b");
    }
}
