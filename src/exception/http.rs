use crate::error::GateError;
use crate::exception::{ArgumentsHost, ExceptionFilter};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::error::Error;

/// A default exception filter that renders errors as JSON
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpExceptionFilter;

impl ExceptionFilter for HttpExceptionFilter {
    fn catch(&self, error: Box<dyn Error + Send + Sync>, host: &ArgumentsHost) -> Response {
        let (status, code, message) = match error.downcast_ref::<GateError>() {
            Some(gate_error) => (
                gate_error.status_code(),
                gate_error.code(),
                gate_error.to_string(),
            ),
            None => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalError",
                "Internal Server Error".to_string(),
            ),
        };

        let request_id = host.request_id.map(|id| id.to_string());
        if status.is_server_error() {
            tracing::error!(
                request_id = request_id.as_deref().unwrap_or("-"),
                method = %host.method,
                uri = %host.uri,
                error = %error,
                "request failed"
            );
        } else {
            tracing::warn!(
                request_id = request_id.as_deref().unwrap_or("-"),
                method = %host.method,
                uri = %host.uri,
                error = %error,
                "request rejected"
            );
        }

        let mut body = json!({
            "statusCode": status.as_u16(),
            "error": code,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let Some(request_id) = request_id {
            body["requestId"] = json!(request_id);
        }

        (status, Json(body)).into_response()
    }
}
