// SPDX-License-Identifier: MPL-2.0

//! Re-exports [`opcua_core::identity`] under this crate's public surface.
//!
//! The identity type lives in `opcua-core` because
//! [`opcua_core::transport::SecurityOptions`] (built by `ConnectOptions::security_options`
//! and carried into `Transport::open`) needs to hold one; it is re-exported
//! here so callers of this crate don't need to reach into `opcua-core` directly.

pub use opcua_core::identity::{IdentityToken, Password};
