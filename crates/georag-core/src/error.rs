//! Error types for the GeoRAG client
//!
//! Malformed stream records are not errors here: they surface as
//! `StreamEvent::ParseSkipped`. Only transport, API and config failures
//! are represented as `Err` values.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of the byte source feeding the stream assembler
///
/// Terminal for the read loop. Any partial line buffered in the assembler
/// is left unparsed.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stream interrupted: {0}")]
    Interrupted(String),
}

/// REST / streaming API errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid base URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
