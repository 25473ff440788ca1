// SPDX-License-Identifier: MPL-2.0

//! The client core's error taxonomy.
//!
//! Every failure a service call can produce is classified into one of the kinds
//! in [`ErrorKind`]. The classification, not the specific status code, is what
//! decides whether [`crate`]'s caller should trigger session recovery, surface
//! the error to the user verbatim, or treat it as a local usage mistake.

use opcua_types::StatusCode;
use thiserror::Error;

/// The conceptual class a failure falls into, used to route it to the right handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect/read/write/timeout failure on the transport. Recoverable.
    Transport,
    /// The server reports the session or secure channel is no longer valid. Recoverable.
    SessionInvalidated,
    /// Bad node, type mismatch, unsupported service, bad filter. Not recoverable,
    /// surfaced to the caller unchanged.
    Domain,
    /// Malformed response or unrecognised service fault. The session is faulted;
    /// recovery is attempted once.
    Protocol,
    /// Caller error: unknown key, double close, name collision. Synchronous, local.
    Usage,
    /// The operation was cancelled by the caller or hit its deadline.
    Cancelled,
}

/// Errors produced by the client core.
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum OpcUaError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("session is invalid: {0}")]
    SessionInvalidated(StatusCode),
    #[error("service returned a domain error: {0}")]
    Domain(StatusCode),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("usage error: {0}")]
    Usage(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("request timed out")]
    Timeout,
}

impl OpcUaError {
    /// Classify this error into the conceptual kind used to route recovery decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OpcUaError::Transport(_) => ErrorKind::Transport,
            OpcUaError::SessionInvalidated(_) => ErrorKind::SessionInvalidated,
            OpcUaError::Domain(_) => ErrorKind::Domain,
            OpcUaError::Protocol(_) => ErrorKind::Protocol,
            OpcUaError::Usage(_) => ErrorKind::Usage,
            OpcUaError::Cancelled | OpcUaError::Timeout => ErrorKind::Cancelled,
        }
    }

    /// `true` if this error should trigger the Recovery algorithm.
    pub fn triggers_recovery(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Transport | ErrorKind::SessionInvalidated | ErrorKind::Protocol
        )
    }

    /// Classify a status code returned in a (non-exceptional) service response,
    /// distinguishing domain errors that should be handed back to the caller from
    /// session-invalidation errors that must trigger recovery.
    pub fn from_service_result(status: StatusCode) -> Option<Self> {
        if status.is_good() {
            return None;
        }
        if status.is_session_invalidated() {
            return Some(OpcUaError::SessionInvalidated(status));
        }
        if status.bits() == StatusCode::BAD_SUBSCRIPTION_ID_INVALID.bits()
            || status.bits() == StatusCode::BAD_NO_SUBSCRIPTION.bits()
        {
            return Some(OpcUaError::SessionInvalidated(status));
        }
        Some(OpcUaError::Domain(status))
    }
}

impl From<StatusCode> for OpcUaError {
    fn from(value: StatusCode) -> Self {
        OpcUaError::from_service_result(value).unwrap_or(OpcUaError::Domain(value))
    }
}
