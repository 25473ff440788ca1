// SPDX-License-Identifier: MPL-2.0

//! A Session owns a live logical connection to a server over a [`Transport`](opcua_core::Transport),
//! exposes the Read/Write/Browse/Call services, and hosts the background tasks
//! (KeepAlive, Recovery) that keep that connection alive.

mod connect;
mod keep_alive;
pub(crate) mod recovery;
pub(crate) mod request;
pub mod services;
mod session;
mod state;

pub use connect::{ConnectOptions, SecurityMode};
pub use keep_alive::KeepAliveActivity;
pub use session::Session;
pub use state::SessionState;

#[allow(unused)]
macro_rules! session_warn {
    ($session: expr, $($arg:tt)*) => {
        log::warn!("session:{} {}", $session.id(), format!($($arg)*));
    }
}
#[allow(unused)]
pub(crate) use session_warn;

#[allow(unused)]
macro_rules! session_error {
    ($session: expr, $($arg:tt)*) => {
        log::error!("session:{} {}", $session.id(), format!($($arg)*));
    }
}
#[allow(unused)]
pub(crate) use session_error;

#[allow(unused)]
macro_rules! session_debug {
    ($session: expr, $($arg:tt)*) => {
        log::debug!("session:{} {}", $session.id(), format!($($arg)*));
    }
}
#[allow(unused)]
pub(crate) use session_debug;

#[allow(unused)]
macro_rules! session_trace {
    ($session: expr, $($arg:tt)*) => {
        log::trace!("session:{} {}", $session.id(), format!($($arg)*));
    }
}
#[allow(unused)]
pub(crate) use session_trace;
