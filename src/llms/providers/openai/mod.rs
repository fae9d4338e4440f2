//! OpenAI Chat Completions provider.
//!
//! Talks to `{base_url}/chat/completions` with `reqwest`. The HTTP client is
//! built once per provider and reused for every call. There is no retry
//! loop: a failed call is reported to the caller as is.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::llms::base_llm::{BaseLLM, CompletionRequest};
use crate::utilities::errors::LlmError;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Longest provider error body kept in an [`LlmError::Api`].
const MAX_ERROR_BODY_CHARS: usize = 500;

/// OpenAI Chat Completions client.
#[derive(Clone)]
pub struct OpenAICompletion {
    api_key: String,
    base_url: String,
    /// Sent as `OpenAI-Organization` when set.
    pub organization: Option<String>,
    client: reqwest::Client,
}

impl fmt::Debug for OpenAICompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAICompletion")
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenAICompletion {
    /// Create a provider.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer token for the API.
    /// * `base_url` - Optional API root, defaults to [`DEFAULT_BASE_URL`].
    /// * `timeout` - Optional transport timeout; `None` keeps reqwest's default.
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, LlmError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            organization: std::env::var("OPENAI_ORGANIZATION").ok(),
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Build the Chat Completions request body.
    pub fn build_request_body(&self, request: &CompletionRequest<'_>) -> Value {
        serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "response_format": request.response_format,
        })
    }

    /// Pull the first choice's message content out of a response.
    pub fn parse_completions_response(&self, response: &Value) -> Result<String, LlmError> {
        if let Some(usage) = response.get("usage") {
            log::debug!(
                "OpenAI token usage: prompt={}, completion={}, total={}",
                usage.get("prompt_tokens").and_then(|v| v.as_i64()).unwrap_or(0),
                usage.get("completion_tokens").and_then(|v| v.as_i64()).unwrap_or(0),
                usage.get("total_tokens").and_then(|v| v.as_i64()).unwrap_or(0),
            );
        }

        response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl BaseLLM for OpenAICompletion {
    fn provider(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        log::debug!(
            "OpenAICompletion.complete: model={}, messages={}",
            request.model,
            request.messages.len(),
        );

        let body = self.build_request_body(&request);

        let mut http = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body);
        if let Some(ref org) = self.organization {
            http = http.header("OpenAI-Organization", org);
        }

        let response = http.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let json: Value = serde_json::from_str(&text)?;
        self.parse_completions_response(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    /// Serve `reply` with `status` on `/v1/chat/completions`, recording requests.
    async fn spawn_mock(status: StatusCode, reply: Value) -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let recorder = recorder.clone();
                let reply = reply.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    recorder.lock().unwrap().push((auth, body));
                    (status, Json(reply))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v1"), seen)
    }

    fn provider(base_url: Option<String>) -> OpenAICompletion {
        OpenAICompletion::new("sk-test", base_url, None).unwrap()
    }

    #[test]
    fn test_request_body_forces_json_object() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let body = provider(None).build_request_body(&CompletionRequest::json("gpt-4o-mini", &messages));

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "u");
    }

    #[test]
    fn test_parse_response() {
        let p = provider(None);
        let response = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"response\":\"hi\"}"}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        });
        assert_eq!(
            p.parse_completions_response(&response).unwrap(),
            "{\"response\":\"hi\"}"
        );

        let empty = serde_json::json!({"choices": []});
        assert!(matches!(
            p.parse_completions_response(&empty),
            Err(LlmError::EmptyResponse)
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_and_debug_redaction() {
        let p = provider(Some("http://localhost:1234/v1/".into()));
        assert_eq!(p.base_url(), "http://localhost:1234/v1");
        assert_eq!(p.endpoint(), "http://localhost:1234/v1/chat/completions");
        assert!(!format!("{p:?}").contains("sk-test"));
    }

    #[tokio::test]
    async fn test_complete_round_trip() {
        let (base, seen) = spawn_mock(
            StatusCode::OK,
            serde_json::json!({
                "choices": [{"message": {"content": "{\"response\":\"안녕\",\"score\":3}"}}]
            }),
        )
        .await;

        let messages = vec![ChatMessage::user("hi")];
        let content = provider(Some(base))
            .complete(CompletionRequest::json("gpt-4o-mini", &messages))
            .await
            .unwrap();
        assert_eq!(content, "{\"response\":\"안녕\",\"score\":3}");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_deref(), Some("Bearer sk-test"));
        assert_eq!(seen[0].1["response_format"]["type"], "json_object");
    }

    #[tokio::test]
    async fn test_error_status_is_not_retried() {
        let (base, seen) = spawn_mock(
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({"error": {"message": "overloaded"}}),
        )
        .await;

        let messages = vec![ChatMessage::user("hi")];
        let err = provider(Some(base))
            .complete(CompletionRequest::json("m", &messages))
            .await
            .unwrap_err();

        match err {
            LlmError::Api { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("overloaded"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
