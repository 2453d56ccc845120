use thiserror::Error;

/// Errors returned by client composition and request execution.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Base URL is not a valid absolute URL.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    /// Endpoint path could not be joined to the base URL.
    #[error("invalid endpoint path '{0}'")]
    InvalidPath(String),

    /// A default or per-request header could not be encoded.
    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    /// The named extension is missing or is not callable.
    #[error("no callable extension named '{0}'")]
    UnknownMethod(String),

    /// An extension method or builder reported a failure.
    #[error("extension failed: {0}")]
    Extension(String),

    /// HTTP transport-layer request failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body could not be parsed as JSON.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success HTTP status with response payload.
    #[error("server returned status {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Errors returned by schema reading and type generation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A JSON Schema document uses a shape the schema model cannot represent.
    #[error("malformed schema at '{pointer}': {reason}")]
    Malformed { pointer: String, reason: String },

    /// The type compiler rejected the requested declaration name.
    #[error("invalid type name '{0}'")]
    InvalidTypeName(String),

    /// Reading a schema or sample file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A schema or sample file is not valid JSON.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}
