//! Deferred body-parse errors.
//!
//! [`RequestErrorGate::parse`] runs the codec for a buffered request. A failure is
//! handed to the capture hook, whose placeholder is returned as the payload, and the
//! error is parked in the [`RequestContext`]. The first filter of the dispatch stage
//! then calls [`RequestContext::check_pending`], which raises the parked error into
//! the normal error-rendering path.
//!
//! ```text
//! BodyParseLayer ──parse──▶ RequestContext{pending} ──▶ CheckPendingInterceptor ──▶ handler
//!                                                         └─ Err(GateError::Parse) ─▶ ExceptionFilter
//! ```

use crate::codec::CodecRegistry;
use crate::config::GateConfig;
use crate::error::{GateError, ParseError, Result};
use crate::hook::{self, HookSlot};
use std::sync::Arc;
use tracing::Level;

pub mod context;
pub mod extract;
pub mod layer;
pub mod request;

pub use context::{PendingRequestError, RequestContext};
pub use extract::{Params, ParamsRejection};
pub use layer::{BodyParseLayer, BodyParseMiddleware};
pub use request::{CaptureResult, ParsedPayload, RawRequest};

/// Wraps the body-parsing step of the request pipeline
#[derive(Clone)]
pub struct RequestErrorGate {
    codecs: Arc<CodecRegistry>,
    hooks: HookSlot,
    config: GateConfig,
}

impl Default for RequestErrorGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestErrorGate {
    /// Default codecs, default config, and the process-wide hook slot
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> GateBuilder {
        GateBuilder::new()
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn hooks(&self) -> &HookSlot {
        &self.hooks
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decode the request body.
    ///
    /// On success any pending error in `ctx` is cleared. On failure with a hook
    /// configured, the hook's placeholder is returned and the error is deferred in
    /// `ctx`. Without a hook the failure is returned immediately and `ctx` stays
    /// clean.
    pub fn parse(&self, ctx: &mut RequestContext, request: &RawRequest) -> Result<ParsedPayload> {
        let Some(mime) = request.mime() else {
            ctx.clear_pending();
            return Ok(ParsedPayload::Empty);
        };
        let Some(codec) = self.codecs.find(&mime) else {
            tracing::trace!(request_id = %ctx.request_id(), content_type = %mime, "no codec for content type");
            ctx.clear_pending();
            return Ok(ParsedPayload::Empty);
        };
        if request.has_blank_body() {
            ctx.clear_pending();
            return Ok(ParsedPayload::Empty);
        }

        match codec.decode(&request.body) {
            Ok(params) => {
                tracing::trace!(request_id = %ctx.request_id(), codec = codec.name(), "request parameters parsed");
                ctx.clear_pending();
                Ok(ParsedPayload::Params(params))
            }
            Err(error) => {
                let Some(hook) = self.hooks.current() else {
                    ctx.clear_pending();
                    return Err(GateError::Parse(error));
                };
                self.log_failure(ctx, request, &error);
                let captured = hook.capture(request, &error);
                tracing::debug!(request_id = %ctx.request_id(), codec = codec.name(), "parse error deferred");
                ctx.defer(error);
                Ok(ParsedPayload::Captured(captured))
            }
        }
    }

    fn log_failure(&self, ctx: &RequestContext, request: &RawRequest, error: &ParseError) {
        if !self.config.log_failures || !tracing::enabled!(Level::INFO) {
            return;
        }
        let shown = request.body.len().min(self.config.log_body_limit);
        let contents = String::from_utf8_lossy(&request.body[..shown]);
        tracing::info!(
            request_id = %ctx.request_id(),
            content_type = request.content_type().unwrap_or("-"),
            error = %error,
            truncated = shown < request.body.len(),
            contents = %contents,
            "{} occurred while parsing request parameters",
            error.kind()
        );
    }
}

/// Builder for [`RequestErrorGate`]
///
/// # Example
/// ```
/// use request_gate::codec::CodecRegistry;
/// use request_gate::config::GateConfig;
/// use request_gate::gate::RequestErrorGate;
/// use request_gate::hook::HookSlot;
///
/// let gate = RequestErrorGate::builder()
///     .codecs(CodecRegistry::with_defaults())
///     .hooks(HookSlot::default())
///     .config(GateConfig::default().max_body_bytes(64 * 1024))
///     .build();
/// assert!(gate.hooks().is_set());
/// ```
pub struct GateBuilder {
    codecs: CodecRegistry,
    hooks: HookSlot,
    config: GateConfig,
}

impl GateBuilder {
    pub fn new() -> Self {
        Self {
            codecs: CodecRegistry::with_defaults(),
            hooks: hook::global().clone(),
            config: GateConfig::default(),
        }
    }

    pub fn codecs(mut self, codecs: CodecRegistry) -> Self {
        self.codecs = codecs;
        self
    }

    /// Use `hooks` instead of the process-wide slot
    pub fn hooks(mut self, hooks: HookSlot) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(mut self, config: GateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> RequestErrorGate {
        RequestErrorGate {
            codecs: Arc::new(self.codecs),
            hooks: self.hooks,
            config: self.config,
        }
    }
}

impl Default for GateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BodyCodec;
    use axum::http::{HeaderMap, HeaderValue, Method, Uri, header};
    use bytes::Bytes;
    use mime::Mime;
    use serde_json::{Value, json};
    use tracing_test::traced_test;

    fn request(content_type: &'static str, body: &'static str) -> RawRequest {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        RawRequest {
            method: Method::POST,
            uri: Uri::from_static("/items"),
            headers,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    fn gate_with(hooks: HookSlot) -> RequestErrorGate {
        RequestErrorGate::builder().hooks(hooks).build()
    }

    #[test]
    fn test_json_success_clears_pending() {
        let gate = gate_with(HookSlot::default());
        let mut ctx = RequestContext::new();
        ctx.defer(ParseError::Json("stale".into()));

        let payload = gate
            .parse(&mut ctx, &request("application/json", r#"{"x":1}"#))
            .unwrap();

        assert_eq!(payload, ParsedPayload::Params(json!({"x": 1})));
        assert!(!ctx.has_pending());
        assert!(ctx.check_pending().is_ok());
    }

    #[cfg(feature = "xml")]
    #[test]
    fn test_malformed_xml_is_deferred() {
        let gate = gate_with(HookSlot::default());
        let mut ctx = RequestContext::new();

        let payload = gate
            .parse(&mut ctx, &request("application/xml", "<a><b></a>"))
            .unwrap();

        let captured = payload.captured().unwrap();
        assert_eq!(captured.body_text(), "<a><b></a>");
        assert_eq!(captured.content_type.as_deref(), Some("application/xml"));
        assert_eq!(captured.content_length, Some(10));

        let err = ctx.check_pending().unwrap_err();
        assert!(matches!(err, GateError::Parse(ParseError::Xml(_))));
        assert!(err.to_string().contains("expected </b>, found </a>"));

        assert!(ctx.check_pending().is_ok());
    }

    #[test]
    fn test_without_hook_error_is_immediate() {
        let gate = gate_with(HookSlot::empty());
        let mut ctx = RequestContext::new();

        let err = gate
            .parse(&mut ctx, &request("application/json", "{oops"))
            .unwrap_err();

        assert!(matches!(err, GateError::Parse(ParseError::Json(_))));
        assert!(!ctx.has_pending());
    }

    #[test]
    fn test_custom_hook_result_is_the_payload() {
        let hooks = HookSlot::empty();
        hooks.set(|_: &RawRequest, error: &ParseError| CaptureResult {
            body: Bytes::from(error.kind()),
            content_type: Some("text/plain".into()),
            content_length: None,
        });
        let gate = gate_with(hooks);
        let mut ctx = RequestContext::new();

        let payload = gate
            .parse(&mut ctx, &request("application/json", "[1,"))
            .unwrap();

        assert_eq!(payload.captured().unwrap().body_text(), "JsonParseError");
        assert!(ctx.has_pending());
    }

    #[test]
    fn test_hook_swapped_between_requests() {
        let hooks = HookSlot::default();
        let gate = gate_with(hooks.clone());

        let mut first = RequestContext::new();
        assert!(gate.parse(&mut first, &request("application/json", "{")).is_ok());

        hooks.clear();
        let mut second = RequestContext::new();
        assert!(gate.parse(&mut second, &request("application/json", "{")).is_err());
        assert!(first.has_pending());
        assert!(!second.has_pending());
    }

    #[test]
    fn test_unformatted_bodies_are_empty() {
        let gate = gate_with(HookSlot::default());
        let mut ctx = RequestContext::new();

        let cases = [
            request("text/plain", "hello"),
            request("application/json", "   \n"),
            request("not a mime", "{"),
        ];
        for case in &cases {
            assert_eq!(gate.parse(&mut ctx, case).unwrap(), ParsedPayload::Empty);
        }

        let mut no_type = request("application/json", "{");
        no_type.headers.remove(header::CONTENT_TYPE);
        assert_eq!(gate.parse(&mut ctx, &no_type).unwrap(), ParsedPayload::Empty);
        assert!(!ctx.has_pending());
    }

    #[test]
    fn test_custom_codec_failure_is_deferred() {
        struct CsvCodec;

        impl BodyCodec for CsvCodec {
            fn name(&self) -> &'static str {
                "csv"
            }

            fn accepts(&self, mime: &Mime) -> bool {
                mime.essence_str() == "text/csv"
            }

            fn decode(&self, body: &[u8]) -> std::result::Result<Value, ParseError> {
                if body.contains(&b',') {
                    Ok(Value::Bool(true))
                } else {
                    Err(ParseError::codec("csv", "no separator"))
                }
            }
        }

        let gate = RequestErrorGate::builder()
            .codecs(CodecRegistry::new().register(CsvCodec))
            .hooks(HookSlot::default())
            .build();
        let mut ctx = RequestContext::new();

        assert_eq!(
            gate.parse(&mut ctx, &request("text/csv", "a,b")).unwrap(),
            ParsedPayload::Params(Value::Bool(true))
        );
        assert!(gate.parse(&mut ctx, &request("text/csv", "ab")).unwrap().is_captured());

        let err = ctx.check_pending().unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse request parameters: csv decode failed: no separator");
    }

    #[test]
    #[traced_test]
    fn test_failure_is_logged_with_body() {
        let gate = gate_with(HookSlot::default());
        let mut ctx = RequestContext::new();

        gate.parse(&mut ctx, &request("application/json", r#"{"name": }"#))
            .unwrap();

        assert!(logs_contain("JsonParseError occurred while parsing request parameters"));
        assert!(logs_contain(r#"contents={"name": }"#));
    }

    #[test]
    #[traced_test]
    fn test_failure_log_is_truncated() {
        let gate = RequestErrorGate::builder()
            .hooks(HookSlot::default())
            .config(GateConfig::default().log_body_limit(4))
            .build();
        let mut ctx = RequestContext::new();

        let payload = gate
            .parse(&mut ctx, &request("application/json", "{\"abcdefgh\""))
            .unwrap();

        assert!(logs_contain("truncated=true"));
        assert!(logs_contain(r#"contents={"ab"#));
        assert!(!logs_contain("abcdefgh"));
        assert_eq!(payload.captured().unwrap().body_text(), "{\"abcdefgh\"");
    }

    #[test]
    #[traced_test]
    fn test_failure_logging_can_be_disabled() {
        let gate = RequestErrorGate::builder()
            .hooks(HookSlot::default())
            .config(GateConfig::default().log_failures(false))
            .build();
        let mut ctx = RequestContext::new();

        gate.parse(&mut ctx, &request("application/json", "{")).unwrap();

        assert!(!logs_contain("occurred while parsing request parameters"));
        assert!(ctx.has_pending());
    }
}
