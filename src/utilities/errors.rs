//! Error types shared across the game services.
//!
//! These never cross a component boundary: the orchestrator and the
//! repository turn them into sentinel payloads before returning.

use thiserror::Error;

/// Errors raised while resolving settings and secrets.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required secret was found neither in the environment nor in the
    /// secrets file.
    #[error("required secret {key} is not set (checked environment and secrets file)")]
    MissingSecret { key: String },

    /// The secrets file exists but could not be read.
    #[error("failed to read secrets file {path}: {source}")]
    SecretsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The secrets file is not a flat YAML mapping.
    #[error("failed to parse secrets file {path}: {source}")]
    SecretsParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A setting holds a value that cannot be used.
    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Errors from the chat-completion endpoint.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport failure talking to the provider.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The provider answered 2xx but without usable message content.
    #[error("provider response has no message content")]
    EmptyResponse,

    /// The body or the model's message was not the JSON we asked for.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the hosted relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport failure talking to the store.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store rejected the request.
    #[error("store returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The store answered with a body that is not a row list.
    #[error("unexpected response body: {0}")]
    Decode(String),
}
