// SPDX-License-Identifier: MPL-2.0

//! The Session lifecycle state machine. Only `Activated` may service user requests.

/// Lifecycle state of a Session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No channel is open and none is being opened.
    Disconnected,
    /// `connect` or Recovery is in the process of opening a channel.
    Connecting,
    /// A channel is open but the session has not yet been activated. Transitional;
    /// since `Transport::open` performs activation atomically, user code never
    /// observes this state for long.
    Connected,
    /// The session is live and may service requests.
    Activated,
    /// The session hit an unrecoverable error and must be closed and reconnected
    /// by the caller (a fresh `connect`), not resumed.
    Faulted,
    /// `close` was called; terminal.
    Closed,
}

impl SessionState {
    /// `true` if the session may service a user request right now.
    pub fn is_activated(self) -> bool {
        matches!(self, SessionState::Activated)
    }

    /// `true` if the session is permanently done and cannot be recovered.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Faulted)
    }
}
