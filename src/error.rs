use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GateError>;

/// A failure reported by a body codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("malformed YAML: {0}")]
    Yaml(String),

    #[error("malformed JSON: {0}")]
    Json(String),

    #[error("{codec} decode failed: {message}")]
    Codec { codec: String, message: String },
}

impl ParseError {
    /// Class name used in the parse-failure log line.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::Xml(_) => "XmlParseError",
            ParseError::Yaml(_) => "YamlParseError",
            ParseError::Json(_) => "JsonParseError",
            ParseError::Codec { .. } => "CodecError",
        }
    }

    pub fn codec(codec: impl Into<String>, message: impl Into<String>) -> Self {
        ParseError::Codec {
            codec: codec.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Failed to parse request parameters: {0}")]
    Parse(#[from] ParseError),

    #[error("Request body exceeds the {limit} byte limit")]
    BodyTooLarge { limit: usize },

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidConfig { key: String, value: String },

    #[error("Request body was not parsed; is BodyParseLayer installed?")]
    MissingPayload,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GateError::Parse(_) | GateError::BodyRead(_) => StatusCode::BAD_REQUEST,
            GateError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GateError::InvalidConfig { .. } | GateError::MissingPayload | GateError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short machine-readable name, rendered as `error` in JSON bodies.
    pub fn code(&self) -> &'static str {
        match self {
            GateError::Parse(inner) => inner.kind(),
            GateError::BodyTooLarge { .. } => "PayloadTooLarge",
            GateError::BodyRead(_) => "BodyReadError",
            GateError::InvalidConfig { .. } => "InvalidConfig",
            GateError::MissingPayload => "MissingPayload",
            GateError::Internal(_) => "InternalError",
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
