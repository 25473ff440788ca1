// SPDX-License-Identifier: MPL-2.0

//! [`SessionManager`] - a named collection of concurrently live Sessions, for
//! applications that talk to more than one server (or more than one identity
//! on the same server) from a single process.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use opcua_core::config::ClientConfig;
use opcua_core::error::OpcUaError;
use opcua_core::transport::Transport;

use crate::session::{ConnectOptions, Session};

/// Tracks Sessions by a caller-chosen name, enforcing that names are unique
/// among currently live sessions.
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionManager {
    /// An empty manager with no sessions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a new session and register it under `name`.
    ///
    /// Fails with `OpcUaError::Usage` if `name` is already in use by a
    /// session that has not been closed; close the old one (or pick a
    /// different name) first.
    pub async fn create_session(
        &self,
        name: impl Into<String>,
        transport: Arc<dyn Transport>,
        url: impl Into<String>,
        options: ConnectOptions,
        config: ClientConfig,
    ) -> Result<Session, OpcUaError> {
        let name = name.into();
        if self.sessions.read().contains_key(&name) {
            return Err(OpcUaError::Usage(format!("session name '{name}' is already in use")));
        }
        let session = Session::connect(transport, url, options, config).await?;
        self.sessions.write().insert(name, session.clone());
        Ok(session)
    }

    /// Look up a session by name.
    pub fn get(&self, name: &str) -> Option<Session> {
        self.sessions.read().get(name).cloned()
    }

    /// Close and unregister a named session. A no-op, returning `Ok`, if no
    /// session is registered under `name`.
    pub async fn close(&self, name: &str) -> Result<(), OpcUaError> {
        let session = self.sessions.write().remove(name);
        match session {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }

    /// Close and unregister every managed session.
    pub async fn close_all(&self) {
        let sessions: Vec<Session> = self.sessions.write().drain().map(|(_, s)| s).collect();
        for session in sessions {
            if let Err(e) = session.close().await {
                log::warn!("failed to close session {} during close_all: {e}", session.id());
            }
        }
    }

    /// Names of every currently registered session.
    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}
