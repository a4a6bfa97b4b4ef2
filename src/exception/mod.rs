use axum::body::Body;
use axum::http::{Method, Request, Uri};
use axum::response::Response;
use std::error::Error;
use uuid::Uuid;

use crate::gate::RequestContext;

pub mod http;

pub use http::HttpExceptionFilter;

/// Context for exception handling
///
/// Captured before the request is handed down the pipeline, so that the filter can
/// still name the request after it has been consumed.
#[derive(Debug, Clone, Default)]
pub struct ArgumentsHost {
    pub method: Method,
    pub uri: Uri,
    pub request_id: Option<Uuid>,
}

impl ArgumentsHost {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn from_request(request: &Request<Body>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            request_id: request
                .extensions()
                .get::<RequestContext>()
                .map(RequestContext::request_id),
        }
    }
}

/// The ExceptionFilter trait
///
/// Filters handle errors thrown during request processing.
/// They must return a valid Response.
pub trait ExceptionFilter: Send + Sync + 'static {
    /// Catch an exception and return a response
    fn catch(&self, error: Box<dyn Error + Send + Sync>, host: &ArgumentsHost) -> Response;
}
