// SPDX-License-Identifier: MPL-2.0

//! Ambient runtime support shared by the OPC UA client core: configuration loading,
//! the error taxonomy that drives recovery decisions, and the `Transport` contract
//! the client is built against.
//!
//! This crate does not implement OPC UA binary encoding, secure-channel handshakes,
//! or message framing - those are the concern of a `Transport` implementation.

pub mod comms;
pub mod config;
pub mod error;
pub mod identity;
pub mod transport;

pub use error::{ErrorKind, OpcUaError};
pub use identity::{IdentityToken, Password};
pub use transport::{Channel, Transport};
