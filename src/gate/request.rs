use axum::http::{HeaderMap, Method, Uri, header};
use bytes::Bytes;
use mime::Mime;
use serde::Serialize;
use serde_json::Value;

/// A request whose body has been fully buffered
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawRequest {
    /// The `Content-Type` header as sent, parameters included
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    pub fn mime(&self) -> Option<Mime> {
        self.content_type()?.parse().ok()
    }

    /// The declared `Content-Length`, or the buffered length when none was sent
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .or(Some(self.body.len() as u64))
    }

    pub fn has_blank_body(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

/// Placeholder payload produced by a capture hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureResult {
    #[serde(serialize_with = "serialize_lossy")]
    pub body: Bytes,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

impl CaptureResult {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn serialize_lossy<S: serde::Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(body))
}

/// What the body-parsing stage hands to the rest of the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPayload {
    /// Parameters decoded by a codec
    Params(Value),
    /// A parse failure was deferred; this is the hook's placeholder
    Captured(CaptureResult),
    /// No body, a blank body, or a media type no codec accepts
    Empty,
}

impl ParsedPayload {
    pub fn params(&self) -> Option<&Value> {
        match self {
            ParsedPayload::Params(value) => Some(value),
            _ => None,
        }
    }

    pub fn captured(&self) -> Option<&CaptureResult> {
        match self {
            ParsedPayload::Captured(captured) => Some(captured),
            _ => None,
        }
    }

    pub fn is_captured(&self) -> bool {
        matches!(self, ParsedPayload::Captured(_))
    }
}
