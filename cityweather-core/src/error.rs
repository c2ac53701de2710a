use std::path::PathBuf;

use reqwest::StatusCode;

use crate::provider::Endpoint;

/// Failure of a remote weather lookup.
///
/// Every variant belongs to the same "transport" class: the caller surfaces it
/// to the user and leaves the store untouched.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to send request to OpenWeather ({endpoint}): {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("OpenWeather {endpoint} request failed with status {status}: {body}")]
    Api {
        endpoint: Endpoint,
        status: StatusCode,
        body: String,
    },

    #[error("Invalid OpenWeather {endpoint} response: {reason}")]
    InvalidResponse { endpoint: Endpoint, reason: String },
}

/// Failure of a durable write.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key '{0}': use ASCII letters, digits, '-' or '_'")]
    InvalidKey(String),

    #[error("Failed to serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage quota exceeded while writing '{key}' ({needed} of {quota} bytes)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
}
