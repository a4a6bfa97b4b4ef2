use crate::error::{GateError, ParseError};
use uuid::Uuid;

/// A parse failure waiting to be raised at dispatch time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequestError {
    pub error: ParseError,
}

impl PendingRequestError {
    pub fn into_error(self) -> GateError {
        GateError::Parse(self.error)
    }
}

/// Per-request state threaded through the pipeline.
///
/// Every request gets a fresh context, stored in the request's extensions by
/// [`BodyParseLayer`](crate::gate::BodyParseLayer). A pending error is set at most
/// once, while the body is parsed, and consumed at most once by
/// [`check_pending`](Self::check_pending).
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    pending: Option<PendingRequestError>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self::with_request_id(Uuid::new_v4())
    }

    pub fn with_request_id(request_id: Uuid) -> Self {
        Self {
            request_id,
            pending: None,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingRequestError> {
        self.pending.as_ref()
    }

    /// Remove and return the pending error, if any
    pub fn take_pending(&mut self) -> Option<PendingRequestError> {
        self.pending.take()
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Raise the pending error, clearing it so that a second call succeeds.
    pub fn check_pending(&mut self) -> Result<(), GateError> {
        match self.take_pending() {
            Some(pending) => {
                tracing::debug!(request_id = %self.request_id, error = %pending.error, "raising deferred parse error");
                Err(pending.into_error())
            }
            None => Ok(()),
        }
    }

    pub(crate) fn defer(&mut self, error: ParseError) {
        if let Some(previous) = self.pending.replace(PendingRequestError { error }) {
            tracing::warn!(
                request_id = %self.request_id,
                error = %previous.error,
                "pending parse error overwritten before it was raised"
            );
        }
    }
}
