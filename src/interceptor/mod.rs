use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response};
use std::future::Future;
use std::pin::Pin;

pub mod layer;
pub mod logging;
pub mod pending;

pub use layer::{InterceptorLayer, InterceptorMiddleware};
pub use logging::LoggingInterceptor;
pub use pending::CheckPendingInterceptor;

/// standard return type for Interceptors
pub type InterceptorResult = Result<Response, InterceptorError>;

/// A type-erased error for interceptors
pub type InterceptorError = Box<dyn std::error::Error + Send + Sync>;

type BoxRun =
    Box<dyn FnOnce(Request<Body>) -> Pin<Box<dyn Future<Output = InterceptorResult> + Send>> + Send>;

/// Represents the next handler in the chain
pub struct Next {
    pub(crate) run: BoxRun,
}

impl Next {
    /// Create a new Next handler
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Request<Body>) -> Pin<Box<dyn Future<Output = InterceptorResult> + Send>>
            + Send
            + 'static,
    {
        Self { run: Box::new(f) }
    }

    /// Execute the next handler
    pub async fn run(self, request: Request<Body>) -> InterceptorResult {
        (self.run)(request).await
    }
}

/// The Interceptor trait
///
/// Interceptors can inspect/modify the request before it reaches the handler,
/// and inspect/modify the response after the handler returns. Returning an
/// error aborts the chain; the error is rendered by the layer's exception filter.
///
/// # Example
/// ```
/// use request_gate::interceptor::{Interceptor, InterceptorResult, Next};
/// use request_gate::async_trait;
/// use axum::{body::Body, http::Request};
///
/// struct HeaderCheck;
///
/// #[async_trait]
/// impl Interceptor for HeaderCheck {
///     async fn intercept(&self, req: Request<Body>, next: Next) -> InterceptorResult {
///         if !req.headers().contains_key("x-tenant") {
///             return Err("missing tenant".into());
///         }
///         next.run(req).await
///     }
/// }
/// ```
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    async fn intercept(&self, request: Request<Body>, next: Next) -> InterceptorResult;
}
