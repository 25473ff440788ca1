// SPDX-License-Identifier: MPL-2.0

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{Mutex as AsyncMutex, Notify};

use opcua_core::config::ClientConfig;
use opcua_core::error::OpcUaError;
use opcua_core::transport::{
    Channel, SecurityOptions, ServiceRequest, ServiceResponse, Transport,
};
use opcua_types::EndpointDescription;

use crate::session::connect::ConnectOptions;
use crate::session::request::{with_deadline, DEFAULT_CALL_TIMEOUT};
use crate::session::state::SessionState;
use crate::session::{session_debug, session_error, session_warn};
use crate::subscriptions::SubscriptionRegistry;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// A live logical connection to an OPC UA server.
///
/// Cheap to clone: internally an `Arc` over shared state, so KeepAlive, Recovery
/// and user call sites can all hold a handle to the same Session.
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

pub(crate) struct SessionInner {
    pub(crate) id: u64,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) url: String,
    pub(crate) options: ConnectOptions,
    pub(crate) config: ClientConfig,
    pub(crate) state: RwLock<SessionState>,
    pub(crate) state_changed: Notify,
    pub(crate) channel: RwLock<Option<Channel>>,
    pub(crate) recovery_lock: AsyncMutex<()>,
    pub(crate) registry: SubscriptionRegistry,
    pub(crate) request_counter: AtomicU32,
    pub(crate) keep_alive_cancel: Notify,
}

impl Session {
    /// Establish a secure channel and activate a session against it.
    ///
    /// Fails with `OpcUaError::Transport` if the Transport cannot establish a
    /// channel to `url`, or `OpcUaError::Domain` if the server rejects the
    /// requested endpoint, security or identity.
    pub async fn connect(
        transport: Arc<dyn Transport>,
        url: impl Into<String>,
        options: ConnectOptions,
        config: ClientConfig,
    ) -> Result<Session, OpcUaError> {
        let url = url.into();
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::new(SessionInner {
            id,
            transport: transport.clone(),
            url: url.clone(),
            options: options.clone(),
            config,
            state: RwLock::new(SessionState::Connecting),
            state_changed: Notify::new(),
            channel: RwLock::new(None),
            recovery_lock: AsyncMutex::new(()),
            registry: SubscriptionRegistry::new(),
            request_counter: AtomicU32::new(0),
            keep_alive_cancel: Notify::new(),
        });
        let session = Session { inner };

        let channel = transport
            .open(&url, &options.security_options())
            .await
            .map_err(|e| {
                session_warn!(session, "connect failed: {e}");
                e
            })?;
        session.set_channel(Some(channel));
        session.set_state(SessionState::Activated);
        crate::session::keep_alive::spawn(session.clone());
        session_debug!(session, "connected to {}", url);
        Ok(session)
    }

    /// Standalone endpoint discovery: opens a short-lived channel, lists
    /// endpoints, and closes it. Does not require or affect any live Session.
    pub async fn get_endpoints(
        transport: &dyn Transport,
        url: &str,
    ) -> Result<Vec<EndpointDescription>, OpcUaError> {
        let channel = transport.open(url, &SecurityOptions::default()).await?;
        let result = transport.request(&channel, ServiceRequest::GetEndpoints).await;
        transport.close(&channel).await;
        match result? {
            ServiceResponse::GetEndpoints { endpoints } => Ok(endpoints),
            _ => Err(OpcUaError::Protocol(
                "unexpected response to GetEndpoints".to_string(),
            )),
        }
    }

    /// Deadline under which service requests issued by this Session run.
    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.inner.config.request_timeout_ms as u64)
    }

    /// Idempotent teardown: cancels KeepAlive, deletes owned subscriptions, closes
    /// the secure channel. Calling `close` a second time is a no-op that returns `Ok`.
    pub async fn close(&self) -> Result<(), OpcUaError> {
        if self.state().is_terminal() {
            return Ok(());
        }
        self.inner.keep_alive_cancel.notify_waiters();
        self.inner.registry.delete_all(self).await;
        if let Some(channel) = self.inner.channel.read().clone() {
            self.inner.transport.close(&channel).await;
        }
        self.set_channel(None);
        self.set_state(SessionState::Closed);
        session_debug!(self, "closed");
        Ok(())
    }

    /// The session's log-visible identifier. Stable for the lifetime of this
    /// `Session` value, including across Recovery (which mutates state in place).
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    /// Endpoint url this session connects to. Stable across Recovery.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Access to the subscription registry owned by this session.
    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.inner.registry
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        *self.inner.state.write() = state;
        self.inner.state_changed.notify_waiters();
    }

    pub(crate) fn set_channel(&self, channel: Option<Channel>) {
        *self.inner.channel.write() = channel;
    }

    pub(crate) fn channel(&self) -> Option<Channel> {
        self.inner.channel.read().clone()
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// Fail fast unless activated; if Recovery is in flight, wait briefly for it
    /// to finish rather than surfacing a spurious error to the caller.
    pub(crate) async fn ensure_activated(&self) -> Result<(), OpcUaError> {
        if self.state().is_activated() {
            return Ok(());
        }
        if self.state().is_terminal() {
            return Err(OpcUaError::Cancelled);
        }
        let wait = self.inner.state_changed.notified();
        tokio::select! {
            _ = wait => {}
            _ = tokio::time::sleep(self.request_timeout()) => {}
        }
        if self.state().is_activated() {
            Ok(())
        } else {
            session_error!(self, "service call rejected, session not ready");
            Err(OpcUaError::Usage("session not ready".to_string()))
        }
    }

    /// Send one service request over the currently open channel, with
    /// `deadline`, with no retry of any kind. Used by the Publish pump and by
    /// Subscription/MonitoredItem management, both of which implement their
    /// own recovery-aware retry logic rather than the generic one-shot retry
    /// [`Self::send`] performs.
    pub(crate) async fn send_raw(
        &self,
        request: ServiceRequest,
        deadline: Duration,
    ) -> Result<ServiceResponse, OpcUaError> {
        self.inner.request_counter.fetch_add(1, Ordering::Relaxed);
        let Some(channel) = self.channel() else {
            return Err(OpcUaError::SessionInvalidated(
                opcua_types::StatusCode::BAD_NOT_CONNECTED,
            ));
        };
        let transport = self.transport().clone();
        with_deadline(deadline, async move { transport.request(&channel, request).await }).await
    }

    /// Send one service request, transparently running Recovery and retrying
    /// once if the first attempt fails with an error that
    /// [`OpcUaError::triggers_recovery`]. Used by the Read/Write/Browse/Call
    /// facades so a caller observing a transient disconnect during normal use
    /// does not need to implement its own retry loop.
    pub(crate) async fn send(
        &self,
        request: ServiceRequest,
        deadline: Duration,
    ) -> Result<ServiceResponse, OpcUaError> {
        match self.send_raw(request.clone(), deadline).await {
            Ok(response) => Ok(response),
            Err(e) if e.triggers_recovery() => {
                session_warn!(self, "service call failed ({e}), attempting recovery and retrying once");
                crate::session::recovery::attempt(self).await?;
                self.send_raw(request, deadline).await
            }
            Err(e) => Err(e),
        }
    }
}

impl std::ops::Deref for Session {
    type Target = SessionInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Deadline used for `call`, which may run arbitrary server-side logic.
pub(crate) const CALL_TIMEOUT: Duration = DEFAULT_CALL_TIMEOUT;
