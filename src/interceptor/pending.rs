use crate::gate::RequestContext;
use crate::interceptor::{Interceptor, InterceptorResult, Next};
use async_trait::async_trait;
use axum::{body::Body, http::Request};

/// Raises a deferred body-parse error before anything else runs.
///
/// Place it first in the chain. A request that never went through
/// [`BodyParseLayer`](crate::gate::BodyParseLayer) carries no context and passes.
#[derive(Clone, Copy, Debug, Default)]
pub struct CheckPendingInterceptor;

#[async_trait]
impl Interceptor for CheckPendingInterceptor {
    async fn intercept(&self, mut request: Request<Body>, next: Next) -> InterceptorResult {
        if let Some(ctx) = request.extensions_mut().get_mut::<RequestContext>() {
            ctx.check_pending()?;
        }
        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GateError, ParseError};
    use crate::interceptor::InterceptorError;
    use axum::response::{IntoResponse, Response};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn handler(reached: Arc<AtomicBool>) -> Next {
        Next::new(move |_req| {
            Box::pin(async move {
                reached.store(true, Ordering::SeqCst);
                Ok::<Response, InterceptorError>("ok".into_response())
            })
        })
    }

    #[tokio::test]
    async fn test_pending_error_aborts_chain() {
        let mut ctx = RequestContext::new();
        ctx.defer(ParseError::Xml("bad".into()));
        let mut request = Request::new(Body::empty());
        request.extensions_mut().insert(ctx);
        let reached = Arc::new(AtomicBool::new(false));

        let err = CheckPendingInterceptor
            .intercept(request, handler(reached.clone()))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<GateError>(),
            Some(GateError::Parse(ParseError::Xml(_)))
        ));
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_clean_context_passes() {
        let mut request = Request::new(Body::empty());
        request.extensions_mut().insert(RequestContext::new());
        let reached = Arc::new(AtomicBool::new(false));

        let response = CheckPendingInterceptor
            .intercept(request, handler(reached.clone()))
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert!(reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_missing_context_passes() {
        let reached = Arc::new(AtomicBool::new(false));
        let result = CheckPendingInterceptor
            .intercept(Request::new(Body::empty()), handler(reached.clone()))
            .await;
        assert!(result.is_ok());
        assert!(reached.load(Ordering::SeqCst));
    }
}
