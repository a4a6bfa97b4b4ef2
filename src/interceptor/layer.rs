use crate::exception::{ArgumentsHost, ExceptionFilter, HttpExceptionFilter};
use crate::interceptor::{Interceptor, InterceptorError, InterceptorResult, Next};
use axum::{body::Body, http::Request, response::Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower Layer for invoking a chain of Interceptors
///
/// Interceptors run in the order given. An error from any of them, or from the
/// inner service's `call`, is rendered by the exception filter. Readiness errors of
/// the inner service are returned from `poll_ready` unchanged.
///
/// # Example
/// ```
/// use request_gate::interceptor::{CheckPendingInterceptor, InterceptorLayer, LoggingInterceptor};
///
/// let layer = InterceptorLayer::new(vec![
///     Box::new(CheckPendingInterceptor),
///     Box::new(LoggingInterceptor),
/// ]);
/// ```
#[derive(Clone)]
pub struct InterceptorLayer {
    interceptors: Arc<Vec<Box<dyn Interceptor>>>,
    filter: Arc<dyn ExceptionFilter>,
}

impl InterceptorLayer {
    pub fn new(interceptors: Vec<Box<dyn Interceptor>>) -> Self {
        Self {
            interceptors: Arc::new(interceptors),
            filter: Arc::new(HttpExceptionFilter),
        }
    }

    /// Render chain errors with `filter` instead of [`HttpExceptionFilter`]
    pub fn with_filter<F: ExceptionFilter>(mut self, filter: F) -> Self {
        self.filter = Arc::new(filter);
        self
    }
}

impl<S> Layer<S> for InterceptorLayer {
    type Service = InterceptorMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InterceptorMiddleware {
            inner,
            interceptors: self.interceptors.clone(),
            filter: self.filter.clone(),
        }
    }
}

#[derive(Clone)]
pub struct InterceptorMiddleware<S> {
    inner: S,
    interceptors: Arc<Vec<Box<dyn Interceptor>>>,
    filter: Arc<dyn ExceptionFilter>,
}

impl<S> Service<Request<Body>> for InterceptorMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<InterceptorError> + Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let interceptors = self.interceptors.clone();
        let filter = self.filter.clone();
        // `self.inner` was driven to readiness; move it into the future and leave the clone.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let host = ArgumentsHost::from_request(&request);

            // Innermost link: the wrapped service.
            let mut chain = Next::new(move |req| {
                Box::pin(async move {
                    let result: InterceptorResult = inner.call(req).await.map_err(Into::into);
                    result
                })
            });

            // Wrap from the back so interceptors[0] runs first.
            for i in (0..interceptors.len()).rev() {
                let interceptors = interceptors.clone();
                let next = chain;
                chain = Next::new(move |req| {
                    Box::pin(async move { interceptors[i].intercept(req, next).await })
                });
            }

            let result: InterceptorResult = chain.run(request).await;
            Ok::<_, S::Error>(result.unwrap_or_else(|error| filter.catch(error, &host)))
        })
    }
}
