use crate::error::GateError;
use crate::exception::{ArgumentsHost, ExceptionFilter, HttpExceptionFilter};
use crate::gate::{ParsedPayload, RequestContext};
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

/// Axum extractor for the decoded request parameters
///
/// Raises any deferred parse error first, so a handler never sees the capture
/// hook's placeholder. A body without a codec yields an empty object.
///
/// # Example
/// ```
/// use request_gate::gate::Params;
/// use axum::Json;
/// use serde_json::Value;
///
/// async fn create_item(Params(params): Params) -> Json<Value> {
///     Json(params)
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Params(pub Value);

impl<S> FromRequestParts<S> for Params
where
    S: Send + Sync,
{
    type Rejection = ParamsRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut host = ArgumentsHost::new(parts.method.clone(), parts.uri.clone());
        if let Some(ctx) = parts.extensions.get_mut::<RequestContext>() {
            host = host.with_request_id(ctx.request_id());
            if let Err(error) = ctx.check_pending() {
                return Err(ParamsRejection { error, host });
            }
        }

        let error = match parts.extensions.get::<ParsedPayload>() {
            Some(ParsedPayload::Params(value)) => return Ok(Params(value.clone())),
            Some(ParsedPayload::Empty) => return Ok(Params(Value::Object(Map::new()))),
            Some(ParsedPayload::Captured(_)) => GateError::Internal(
                "placeholder payload reached a handler after its error was consumed".to_string(),
            ),
            None => GateError::MissingPayload,
        };
        Err(ParamsRejection { error, host })
    }
}

/// Rejection raised by [`Params`]
///
/// Renders through [`HttpExceptionFilter`], so a handler-level rejection has the
/// same JSON body as an error raised by an interceptor.
#[derive(Debug)]
pub struct ParamsRejection {
    error: GateError,
    host: ArgumentsHost,
}

impl ParamsRejection {
    pub fn error(&self) -> &GateError {
        &self.error
    }

    pub fn into_error(self) -> GateError {
        self.error
    }
}

impl IntoResponse for ParamsRejection {
    fn into_response(self) -> Response {
        HttpExceptionFilter.catch(Box::new(self.error), &self.host)
    }
}

impl std::ops::Deref for Params {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
