// SPDX-License-Identifier: MPL-2.0

//! `StatusCode` - the 32-bit result code attached to every OPC UA service response.

use std::fmt;

/// A 32-bit status code.
///
/// The top two bits of the code determine its severity: `00` is Good, `01` is
/// Uncertain, `10` is Bad. [`StatusCode::is_good`] checks exactly that invariant.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Default)]
pub struct StatusCode(pub u32);

const SEVERITY_MASK: u32 = 0xC000_0000;
const SEVERITY_GOOD: u32 = 0x0000_0000;
const SEVERITY_BAD: u32 = 0x8000_0000;

impl StatusCode {
    /// `true` if the severity bits indicate Good (top two bits are both zero).
    pub fn is_good(&self) -> bool {
        self.0 & SEVERITY_MASK == SEVERITY_GOOD
    }

    /// `true` if the severity bits indicate Bad.
    pub fn is_bad(&self) -> bool {
        self.0 & SEVERITY_MASK == SEVERITY_BAD
    }

    /// `true` if the severity bits indicate Uncertain.
    pub fn is_uncertain(&self) -> bool {
        self.0 & SEVERITY_MASK == 0x4000_0000
    }

    /// The condition part of the code, with severity and sub-code bits masked off,
    /// used for comparisons that should ignore the reserved low bits.
    pub fn bits(&self) -> u32 {
        self.0 & 0xFFFF_0000
    }

    /// Generic success code.
    pub const GOOD: StatusCode = StatusCode(0x0000_0000);
    /// The session id given is not known to the server, or has expired.
    pub const BAD_SESSION_ID_INVALID: StatusCode = StatusCode(0x8025_0000);
    /// The secure channel id given does not exist, or has expired.
    pub const BAD_SECURE_CHANNEL_ID_INVALID: StatusCode = StatusCode(0x8022_0000);
    /// The session was not yet activated on the server.
    pub const BAD_SESSION_NOT_ACTIVATED: StatusCode = StatusCode(0x8041_0000);
    /// The subscription id is not known, or has already been deleted.
    pub const BAD_SUBSCRIPTION_ID_INVALID: StatusCode = StatusCode(0x8026_0000);
    /// There is no subscription available for this session.
    pub const BAD_NO_SUBSCRIPTION: StatusCode = StatusCode(0x8056_0000);
    /// The server has reached its limit on outstanding publish requests.
    pub const BAD_TOO_MANY_PUBLISH_REQUESTS: StatusCode = StatusCode(0x8067_0000);
    /// The requested service is not supported by the server.
    pub const BAD_SERVICE_UNSUPPORTED: StatusCode = StatusCode(0x8010_0000);
    /// The data type of a value does not match the expected data type.
    pub const BAD_TYPE_MISMATCH: StatusCode = StatusCode(0x80740000);
    /// The event filter is not valid.
    pub const BAD_EVENT_FILTER_INVALID: StatusCode = StatusCode(0x80470000);
    /// The requested node id does not refer to a node in the address space.
    pub const BAD_NODE_ID_UNKNOWN: StatusCode = StatusCode(0x8033_0000);
    /// The syntax of the node id is not valid.
    pub const BAD_NODE_ID_INVALID: StatusCode = StatusCode(0x8032_0000);
    /// The operation timed out.
    pub const BAD_TIMEOUT: StatusCode = StatusCode(0x800A_0000);
    /// The operation was cancelled.
    pub const BAD_REQUEST_CANCELLED_BY_CLIENT: StatusCode = StatusCode(0x80ef_0000);
    /// The secure channel / socket is not connected.
    pub const BAD_NOT_CONNECTED: StatusCode = StatusCode(0x80ac_0000);
    /// Communication with the server failed.
    pub const BAD_COMMUNICATION_ERROR: StatusCode = StatusCode(0x80050000);
    /// An internal error occurred as a result of a programming or configuration error.
    pub const BAD_INTERNAL_ERROR: StatusCode = StatusCode(0x80020000);
    /// An unexpected error occurred.
    pub const BAD_UNEXPECTED_ERROR: StatusCode = StatusCode(0x80010000);
    /// The response to a request was not recognised.
    pub const BAD_UNKNOWN_RESPONSE: StatusCode = StatusCode(0x80090000);
    /// The endpoint url is not valid or does not exist.
    pub const BAD_TCP_ENDPOINT_URL_INVALID: StatusCode = StatusCode(0x80060000);
    /// The server does not support the requested security policy.
    pub const BAD_SECURITY_POLICY_REJECTED: StatusCode = StatusCode(0x80140000);
    /// No endpoint could be found that matches the requested criteria.
    pub const BAD_ENDPOINT_UNAVAILABLE: StatusCode = StatusCode(0x80660000);
    /// Activating the session on the server failed.
    pub const BAD_IDENTITY_TOKEN_REJECTED: StatusCode = StatusCode(0x80430000);
    /// The arguments provided do not match the signature of the method.
    pub const BAD_ARGUMENTS_MISSING: StatusCode = StatusCode(0x80770000);
    /// The server does not recognise the requested operation.
    pub const BAD_NOTHING_TO_DO: StatusCode = StatusCode(0x80110000);
    /// Generic request/session invalidation used internally to signal recovery.
    pub const BAD_SESSION_CLOSED: StatusCode = StatusCode(0x8086_0000);

    /// The set of codes that indicate the session/channel is no longer usable and
    /// recovery should be attempted, classified as `ErrorKind::SessionInvalidated`.
    pub fn is_session_invalidated(&self) -> bool {
        let bits = self.bits();
        bits == Self::BAD_SESSION_ID_INVALID.bits()
            || bits == Self::BAD_SECURE_CHANNEL_ID_INVALID.bits()
            || bits == Self::BAD_SESSION_NOT_ACTIVATED.bits()
            || bits == Self::BAD_SESSION_CLOSED.bits()
            || bits == Self::BAD_NOT_CONNECTED.bits()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl From<u32> for StatusCode {
    fn from(v: u32) -> Self {
        StatusCode(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn good_iff_top_two_bits_zero() {
        assert!(StatusCode::GOOD.is_good());
        assert!(!StatusCode::BAD_SESSION_ID_INVALID.is_good());
        assert!(StatusCode::BAD_SESSION_ID_INVALID.is_bad());
        assert!(!StatusCode(0x4000_0000).is_good());
        assert!(StatusCode(0x4000_0000).is_uncertain());
    }

    #[test]
    fn session_invalidated_codes() {
        assert!(StatusCode::BAD_SESSION_ID_INVALID.is_session_invalidated());
        assert!(StatusCode::BAD_SECURE_CHANNEL_ID_INVALID.is_session_invalidated());
        assert!(StatusCode::BAD_SESSION_CLOSED.is_session_invalidated());
        assert!(!StatusCode::BAD_NODE_ID_UNKNOWN.is_session_invalidated());
    }

    #[test]
    fn session_closed_does_not_alias_internal_error() {
        assert_ne!(
            StatusCode::BAD_SESSION_CLOSED.bits(),
            StatusCode::BAD_INTERNAL_ERROR.bits()
        );
        assert!(!StatusCode::BAD_INTERNAL_ERROR.is_session_invalidated());
    }
}
