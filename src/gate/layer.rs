use crate::error::GateError;
use crate::exception::{ArgumentsHost, ExceptionFilter, HttpExceptionFilter};
use crate::gate::{RawRequest, RequestContext, RequestErrorGate};
use axum::{body::Body, http::Request, response::Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower Layer for the body-parsing stage
///
/// Buffers the body, runs [`RequestErrorGate::parse`], and stores the
/// [`ParsedPayload`](crate::gate::ParsedPayload) and a fresh [`RequestContext`] in the
/// request extensions. The buffered bytes are put back as the request body.
///
/// Errors that are not deferred (oversized body, unreadable body, parse failure
/// with no capture hook) are answered right away by the exception filter.
#[derive(Clone)]
pub struct BodyParseLayer {
    gate: RequestErrorGate,
    filter: Arc<dyn ExceptionFilter>,
}

impl BodyParseLayer {
    pub fn new(gate: RequestErrorGate) -> Self {
        Self {
            gate,
            filter: Arc::new(HttpExceptionFilter),
        }
    }

    pub fn with_filter<F: ExceptionFilter>(mut self, filter: F) -> Self {
        self.filter = Arc::new(filter);
        self
    }
}

impl<S> Layer<S> for BodyParseLayer {
    type Service = BodyParseMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BodyParseMiddleware {
            inner,
            gate: self.gate.clone(),
            filter: self.filter.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BodyParseMiddleware<S> {
    inner: S,
    gate: RequestErrorGate,
    filter: Arc<dyn ExceptionFilter>,
}

impl<S> Service<Request<Body>> for BodyParseMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let gate = self.gate.clone();
        let filter = self.filter.clone();
        // `self.inner` was driven to readiness; move it into the future and leave the clone.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (mut parts, body) = request.into_parts();
            let mut ctx = RequestContext::new();
            let host = ArgumentsHost::new(parts.method.clone(), parts.uri.clone())
                .with_request_id(ctx.request_id());

            let limit = gate.config().max_body_bytes;
            let body = match Limited::new(body, limit).collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    let error = if err.downcast_ref::<LengthLimitError>().is_some() {
                        GateError::BodyTooLarge { limit }
                    } else {
                        GateError::BodyRead(err.to_string())
                    };
                    return Ok(filter.catch(Box::new(error), &host));
                }
            };

            let raw = RawRequest {
                method: parts.method.clone(),
                uri: parts.uri.clone(),
                headers: parts.headers.clone(),
                body,
            };

            match gate.parse(&mut ctx, &raw) {
                Ok(payload) => {
                    parts.extensions.insert(payload);
                    parts.extensions.insert(ctx);
                    inner.call(Request::from_parts(parts, Body::from(raw.body))).await
                }
                Err(error) => Ok(filter.catch(Box::new(error), &host)),
            }
        })
    }
}
