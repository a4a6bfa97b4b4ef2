use crate::exception::ArgumentsHost;
use crate::interceptor::{Interceptor, InterceptorResult, Next};
use async_trait::async_trait;
use axum::{body::Body, http::Request};
use std::time::Instant;

/// An interceptor that logs request timing and status
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingInterceptor;

#[async_trait]
impl Interceptor for LoggingInterceptor {
    async fn intercept(&self, request: Request<Body>, next: Next) -> InterceptorResult {
        let host = ArgumentsHost::from_request(&request);
        let request_id = host.request_id.map(|id| id.to_string());
        let start = Instant::now();

        tracing::info!(request_id = request_id.as_deref().unwrap_or("-"), "--> {} {}", host.method, host.uri);

        match next.run(request).await {
            Ok(response) => {
                tracing::info!(
                    request_id = request_id.as_deref().unwrap_or("-"),
                    status = response.status().as_u16(),
                    elapsed = ?start.elapsed(),
                    "<-- {} {}",
                    host.method,
                    host.uri
                );
                Ok(response)
            }
            Err(e) => {
                tracing::info!(
                    request_id = request_id.as_deref().unwrap_or("-"),
                    error = %e,
                    elapsed = ?start.elapsed(),
                    "<-- {} {} ERROR",
                    host.method,
                    host.uri
                );
                Err(e)
            }
        }
    }
}
