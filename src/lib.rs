//! # request-gate
//!
//! Deferred request-body parse errors for axum applications.
//!
//! A malformed XML, YAML or JSON body does not blow up the parsing stage. The
//! failure is handed to a capture hook, whose placeholder payload lets the request
//! continue, and the error is parked in a per-request [`RequestContext`]. The first
//! interceptor of the dispatch stage raises it again, so the application's usual
//! exception filter renders it like any other error.
//!
//! ## Features
//!
//! - **Pluggable codecs**: JSON, XML (`xml` feature) and YAML (`yaml` feature) built in,
//!   custom formats through [`BodyCodec`](codec::BodyCodec)
//! - **Replaceable capture hook**: one process-wide [`HookSlot`](hook::HookSlot); an
//!   empty slot makes parse errors fail fast
//! - **Consume-once replay**: [`CheckPendingInterceptor`](interceptor::CheckPendingInterceptor)
//!   and the [`Params`](gate::Params) extractor raise a parked error exactly once
//! - **Uniform rendering**: every error goes through an [`ExceptionFilter`](exception::ExceptionFilter)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use request_gate::prelude::*;
//! use axum::routing::post;
//! use tower::ServiceBuilder;
//!
//! async fn create_item(Params(params): Params) -> Json<serde_json::Value> {
//!     Json(params)
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let gate = RequestErrorGate::builder()
//!         .config(GateConfig::from_env().expect("invalid gate configuration"))
//!         .build();
//!
//!     let app: Router = Router::new().route("/items", post(create_item)).layer(
//!         ServiceBuilder::new()
//!             .layer(BodyParseLayer::new(gate))
//!             .layer(InterceptorLayer::new(vec![
//!                 Box::new(CheckPendingInterceptor),
//!                 Box::new(LoggingInterceptor),
//!             ])),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod exception;
pub mod gate;
pub mod hook;
pub mod interceptor;

// Re-export core types
pub use error::{GateError, ParseError, Result};
pub use gate::{
    BodyParseLayer, CaptureResult, Params, ParsedPayload, PendingRequestError, RawRequest,
    RequestContext, RequestErrorGate,
};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use request_gate::prelude::*;
/// ```
pub mod prelude {
    pub use crate::codec::{BodyCodec, CodecRegistry};
    pub use crate::config::{ConfigService, GateConfig};
    pub use crate::error::{GateError, ParseError, Result};
    pub use crate::exception::{ArgumentsHost, ExceptionFilter, HttpExceptionFilter};
    pub use crate::gate::{
        BodyParseLayer, CaptureResult, GateBuilder, Params, ParamsRejection, ParsedPayload,
        PendingRequestError, RawRequest, RequestContext, RequestErrorGate,
    };
    pub use crate::hook::{CaptureHook, DefaultCaptureHook, HookSlot};
    pub use crate::interceptor::{
        CheckPendingInterceptor, Interceptor, InterceptorLayer, InterceptorResult,
        LoggingInterceptor, Next,
    };
    pub use async_trait::async_trait;
    pub use axum::{
        Json, Router,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
