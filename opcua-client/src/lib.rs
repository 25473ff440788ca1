// SPDX-License-Identifier: MPL-2.0

//! The OPC UA client core: Session lifecycle, Subscription/MonitoredItem
//! management, and automatic Recovery on connection loss.
//!
//! This crate owns none of the wire protocol. It is built entirely against
//! [`opcua_core::Transport`]; an application links in a concrete Transport
//! implementation (OPC UA binary/TCP, a simulator, a test double) to get a
//! working client.
//!
//! The public surface is small by design: [`identity_token::IdentityToken`]
//! to authenticate, [`session::Session`] to connect and issue Read/Write/
//! Browse/Call, [`session::Session::subscriptions`] for the
//! [`subscriptions::SubscriptionRegistry`], and [`SessionManager`] for
//! applications juggling more than one Session at a time.

pub mod identity_token;
pub mod session;
pub mod session_manager;
pub mod subscriptions;

pub use identity_token::IdentityToken;
pub use session::{ConnectOptions, SecurityMode, Session, SessionState};
pub use session_manager::SessionManager;
pub use subscriptions::{
    Callbacks, ClientHandle, DataChangeCallback, EventCallback, EventFields, FilterUpdate,
    ModifyOutcome, MonitoredItemSpec, MonitoringFilterSpec, NotificationSink, SubscriptionKey,
    SubscriptionParams, SubscriptionRegistry, SubscriptionSummary,
};

pub use opcua_core::config::ClientConfig;
pub use opcua_core::error::{ErrorKind, OpcUaError};
pub use opcua_core::transport::Transport;
