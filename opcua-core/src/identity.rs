// SPDX-License-Identifier: MPL-2.0

//! The identity a Session presents to the server on activation, carried
//! through [`crate::transport::SecurityOptions`] so a [`crate::Transport`]
//! implementation can actually act on it.

/// A wrapper around a password that intentionally does not expose it via `Debug`.
#[derive(Clone)]
pub struct Password(pub(crate) String);

impl Password {
    /// Create a new password from a string.
    pub fn new(password: impl Into<String>) -> Self {
        Password(password.into())
    }
}

impl<T> From<T> for Password
where
    T: Into<String>,
{
    fn from(value: T) -> Self {
        Password(value.into())
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Password").field(&"*****").finish()
    }
}

/// Client-side identity token presented on session activation.
///
/// A [`crate::Transport`] is expected to present this to the server as part
/// of `ActivateSession`. A server that rejects it (bad credentials, expired
/// certificate, unsupported token type) fails the `open` call with
/// `OpcUaError::Domain(StatusCode::BAD_IDENTITY_TOKEN_REJECTED)` - the
/// `ActivateFailed` outcome of `Session::connect`.
#[derive(Debug, Clone)]
pub enum IdentityToken {
    /// No identity presented.
    Anonymous,
    /// A user name and password.
    UserName(String, Password),
    /// A DER-encoded X.509 certificate and its matching private key. The core treats
    /// both as opaque bytes; a Transport implementation supplies the cryptography.
    Certificate {
        /// DER-encoded certificate.
        cert_der: Vec<u8>,
        /// DER-encoded private key.
        key_der: Vec<u8>,
    },
}

impl IdentityToken {
    /// Create an anonymous identity token.
    pub fn anonymous() -> Self {
        IdentityToken::Anonymous
    }

    /// Create a user name/password identity token.
    pub fn user_name(user_name: impl Into<String>, password: impl Into<Password>) -> Self {
        IdentityToken::UserName(user_name.into(), password.into())
    }

    /// Create a certificate identity token from DER-encoded bytes.
    pub fn certificate(cert_der: impl Into<Vec<u8>>, key_der: impl Into<Vec<u8>>) -> Self {
        IdentityToken::Certificate {
            cert_der: cert_der.into(),
            key_der: key_der.into(),
        }
    }
}

impl Default for IdentityToken {
    fn default() -> Self {
        IdentityToken::Anonymous
    }
}
