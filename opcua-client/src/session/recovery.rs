// SPDX-License-Identifier: MPL-2.0

//! Reconnect-and-recreate: on transport or session failure, rebuilds the
//! Session and then re-establishes every Subscription and MonitoredItem the
//! Registry knows about, preserving their user-visible identities.

use std::time::Duration;

use opcua_core::error::OpcUaError;
use opcua_types::StatusCode;

use crate::session::state::SessionState;
use crate::session::{session_error, session_warn};
use crate::session::Session;

const MAX_RECONNECT_ATTEMPTS: u32 = 6;

/// Run the Recovery algorithm for `session`.
///
/// At most one Recovery runs per Session at a time. A caller that arrives
/// while Recovery is already in flight waits for the lock; once it acquires
/// it, it checks whether the session is already `Activated` again (the prior
/// attempt having already succeeded) and if so returns immediately without
/// repeating the work.
pub(crate) async fn attempt(session: &Session) -> Result<(), OpcUaError> {
    let _guard = session.inner.recovery_lock.lock().await;

    if session.state().is_activated() {
        return Ok(());
    }
    if session.state().is_terminal() {
        return Err(OpcUaError::Cancelled);
    }

    session_warn!(session, "recovery: session lost, reconnecting");
    session.set_state(SessionState::Connecting);

    if let Some(channel) = session.channel() {
        session.transport().close(&channel).await;
    }
    session.set_channel(None);

    let initial_backoff = Duration::from_millis(session.inner.config.reconnect_initial_delay_ms);
    let max_backoff = Duration::from_millis(session.inner.config.reconnect_max_delay_ms);
    let mut backoff = initial_backoff;
    let mut last_err = None;
    let mut reconnected = false;
    for attempt_no in 1..=MAX_RECONNECT_ATTEMPTS {
        match session
            .transport()
            .open(session.url(), &session.inner.options.security_options())
            .await
        {
            Ok(channel) => {
                session.set_channel(Some(channel));
                reconnected = true;
                break;
            }
            Err(e) => {
                session_warn!(
                    session,
                    "recovery: reconnect attempt {attempt_no}/{MAX_RECONNECT_ATTEMPTS} failed: {e}"
                );
                last_err = Some(e);
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(max_backoff);
            }
        }
    }

    if !reconnected {
        session.set_state(SessionState::Faulted);
        session_error!(session, "recovery: giving up, session lost");
        return Err(last_err.unwrap_or(OpcUaError::SessionInvalidated(StatusCode::BAD_SESSION_CLOSED)));
    }

    session.set_state(SessionState::Activated);

    let subscriptions = session.subscriptions().snapshot();
    for subscription in subscriptions {
        match subscription.recreate(session).await {
            Ok(()) => session.subscriptions().reindex(&subscription),
            Err(e) => session_error!(
                session,
                "recovery: failed to recreate subscription {:?}: {e}",
                subscription.key()
            ),
        }
    }

    session_warn!(session, "recovery: session restored");
    Ok(())
}
