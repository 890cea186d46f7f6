//! Error taxonomy shared by the store shim, backend client and controllers.
//!
//! Binaries and glue code use `anyhow` with context; the library layers return
//! [`ScoutError`] so controllers can decide between an inline error and an alert.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{operation} failed: {status}")]
    Backend {
        operation: &'static str,
        status: StatusCode,
    },

    #[error("network error during {operation}: {source}")]
    Network {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0}")]
    EmptyInput(&'static str),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected response from {operation}: {message}")]
    InvalidResponse {
        operation: &'static str,
        message: String,
    },
}

pub type ScoutResult<T> = std::result::Result<T, ScoutError>;

impl ScoutError {
    pub fn network(operation: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| ScoutError::Network { operation, source }
    }

    pub fn decode(what: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| ScoutError::Decode { what, source }
    }
}
