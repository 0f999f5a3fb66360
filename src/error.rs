//! Error types shared by the transport, the adapters and the facade.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A provided `Extension` method was called without being overridden.
    #[error("{0} not implemented")]
    NotImplemented(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Upstream payload is missing structure the adapter depends on.
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    /// A fan-out branch panicked before producing a result.
    #[error("Task failed: {0}")]
    Task(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
