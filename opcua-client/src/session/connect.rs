// SPDX-License-Identifier: MPL-2.0

//! Options accepted by [`super::Session::connect`].

use opcua_core::transport::SecurityOptions;
use opcua_types::MessageSecurityMode;

use crate::identity_token::IdentityToken;

/// Requested security mode for the secure channel. Re-exported under a
/// client-facing name; maps directly onto [`MessageSecurityMode`].
pub type SecurityMode = MessageSecurityMode;

/// Options passed to [`super::Session::connect`].
#[derive(Clone, Debug)]
pub struct ConnectOptions {
    /// Security mode to request from the server.
    pub security: SecurityMode,
    /// Security policy URI to request; empty string means `None`.
    pub security_policy_uri: String,
    /// Identity presented on activation.
    pub user_token: IdentityToken,
    /// Requested session timeout, in milliseconds. The server may revise this down.
    pub session_timeout_ms: u32,
    /// If the caller already knows which advertised endpoint to use, its index
    /// into a prior `get_endpoints` call. `None` selects the first matching endpoint.
    pub requested_endpoint_index: Option<usize>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            security: SecurityMode::None,
            security_policy_uri: String::new(),
            user_token: IdentityToken::Anonymous,
            session_timeout_ms: 3_600_000,
            requested_endpoint_index: None,
        }
    }
}

impl ConnectOptions {
    pub(crate) fn security_options(&self) -> SecurityOptions {
        SecurityOptions {
            security_mode: self.security,
            security_policy_uri: self.security_policy_uri.clone(),
            identity: self.user_token.clone(),
        }
    }
}
