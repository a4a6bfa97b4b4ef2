use crate::error::ParseError;
use crate::gate::{CaptureResult, RawRequest};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// The CaptureHook trait
///
/// Converts a body-parse failure into the placeholder payload handed to later
/// pipeline stages. The failure itself is stored by the gate, not by the hook.
///
/// Any `Fn(&RawRequest, &ParseError) -> CaptureResult` closure is a hook.
///
/// # Example
/// ```
/// use request_gate::hook::HookSlot;
/// use request_gate::gate::{CaptureResult, RawRequest};
/// use request_gate::error::ParseError;
///
/// let slot = HookSlot::empty();
/// slot.set(|request: &RawRequest, _error: &ParseError| CaptureResult {
///     body: request.body.clone(),
///     content_type: None,
///     content_length: None,
/// });
/// assert!(slot.is_set());
/// ```
pub trait CaptureHook: Send + Sync + 'static {
    fn capture(&self, request: &RawRequest, error: &ParseError) -> CaptureResult;
}

impl<F> CaptureHook for F
where
    F: Fn(&RawRequest, &ParseError) -> CaptureResult + Send + Sync + 'static,
{
    fn capture(&self, request: &RawRequest, error: &ParseError) -> CaptureResult {
        self(request, error)
    }
}

/// Snapshots the raw body, declared content type and content length
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCaptureHook;

impl CaptureHook for DefaultCaptureHook {
    fn capture(&self, request: &RawRequest, _error: &ParseError) -> CaptureResult {
        CaptureResult {
            body: request.body.clone(),
            content_type: request.content_type().map(str::to_owned),
            content_length: request.content_length(),
        }
    }
}

/// Replaceable capture hook shared by every gate that holds a clone of the slot.
///
/// An empty slot disables deferral: parse failures are returned immediately.
/// Readers take a clone of the current `Arc`, so a hook swapped while requests are
/// in flight is observed either entirely old or entirely new.
#[derive(Clone)]
pub struct HookSlot {
    hook: Arc<RwLock<Option<Arc<dyn CaptureHook>>>>,
}

impl Default for HookSlot {
    fn default() -> Self {
        Self::new(DefaultCaptureHook)
    }
}

impl HookSlot {
    pub fn new<H: CaptureHook>(hook: H) -> Self {
        Self {
            hook: Arc::new(RwLock::new(Some(Arc::new(hook)))),
        }
    }

    pub fn empty() -> Self {
        Self {
            hook: Arc::new(RwLock::new(None)),
        }
    }

    pub fn set<H: CaptureHook>(&self, hook: H) {
        let mut slot = self.hook.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(hook));
        tracing::debug!("capture hook replaced");
    }

    pub fn clear(&self) {
        let mut slot = self.hook.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        tracing::debug!("capture hook cleared; parse errors will propagate immediately");
    }

    pub fn current(&self) -> Option<Arc<dyn CaptureHook>> {
        self.hook
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.hook
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

static GLOBAL: LazyLock<HookSlot> = LazyLock::new(HookSlot::default);

/// The process-wide hook slot, pre-populated with [`DefaultCaptureHook`].
pub fn global() -> &'static HookSlot {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, Method, Uri, header};
    use bytes::Bytes;

    fn xml_request(body: &'static str) -> RawRequest {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/xml; charset=utf-8"),
        );
        RawRequest {
            method: Method::POST,
            uri: Uri::from_static("/items"),
            headers,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_default_hook_snapshots_request() {
        let request = xml_request("<a><b></a>");
        let error = ParseError::Xml("boom".into());

        let captured = DefaultCaptureHook.capture(&request, &error);

        assert_eq!(captured.body, Bytes::from_static(b"<a><b></a>"));
        assert_eq!(
            captured.content_type.as_deref(),
            Some("application/xml; charset=utf-8")
        );
        assert_eq!(captured.content_length, Some(10));
    }

    #[test]
    fn test_slot_set_and_clear() {
        let slot = HookSlot::empty();
        assert!(!slot.is_set());
        assert!(slot.current().is_none());

        slot.set(DefaultCaptureHook);
        assert!(slot.is_set());

        slot.clear();
        assert!(slot.current().is_none());
    }

    #[test]
    fn test_clones_share_the_slot() {
        let slot = HookSlot::default();
        let shared = slot.clone();
        shared.clear();
        assert!(!slot.is_set());
    }

    #[test]
    fn test_closure_hook() {
        let slot = HookSlot::empty();
        slot.set(|_: &RawRequest, error: &ParseError| CaptureResult {
            body: Bytes::from(error.kind()),
            content_type: None,
            content_length: None,
        });

        let hook = slot.current().unwrap();
        let captured = hook.capture(&xml_request("<x>"), &ParseError::Xml("bad".into()));
        assert_eq!(captured.body_text(), "XmlParseError");
    }

    #[test]
    fn test_global_slot_starts_with_default_hook() {
        assert!(global().is_set());
    }
}
