// SPDX-License-Identifier: MPL-2.0

//! Background liveness checking. Exercises the Session on a timer and hands
//! off to Recovery the moment it observes a failure.

use std::time::Duration;

use opcua_core::error::OpcUaError;
use opcua_types::{AttributeId, NodeId, StatusCode};

use crate::session::recovery;
use crate::session::session_debug;
use crate::session::session_warn;
use crate::session::Session;

/// Outcome of a single KeepAlive tick, logged for observability.
#[derive(Debug, Clone)]
pub enum KeepAliveActivity {
    /// The liveness read succeeded.
    Succeeded,
    /// The liveness read failed with this status, or the subsequent Recovery
    /// attempt did.
    Failed(StatusCode),
}

fn log_activity(session: &Session, activity: &KeepAliveActivity) {
    session_debug!(session, "keep-alive tick: {activity:?}");
}

/// Best-effort status code for an error that may not carry one (transport
/// failures, timeouts), for reporting in [`KeepAliveActivity::Failed`].
fn error_status(e: &OpcUaError) -> StatusCode {
    match e {
        OpcUaError::SessionInvalidated(s) | OpcUaError::Domain(s) => *s,
        _ => StatusCode::BAD_INTERNAL_ERROR,
    }
}

const BACKOFF_WINDOW: Duration = Duration::from_secs(10);

/// Standard OPC UA `Server_ServerStatus_CurrentTime` node, read as a cheap
/// liveness probe since every server exposes it.
fn current_time_node() -> NodeId {
    NodeId::new(0u16, 2258u32)
}

/// Spawn the KeepAlive task for `session`. Cancels cleanly when the session's
/// `keep_alive_cancel` notifier fires (on `Session::close`).
pub(crate) fn spawn(session: Session) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn(async move { run(session).await })
}

async fn run(session: Session) {
    let interval = Duration::from_millis(session.inner.config.keep_alive_interval_ms as u64);
    let max_consecutive_recovery_failures = session.inner.config.max_keep_alive_failures;
    let mut ticker = tokio::time::interval(interval);
    let mut consecutive_recovery_failures = 0u32;

    loop {
        tokio::select! {
            _ = session.inner.keep_alive_cancel.notified() => break,
            _ = ticker.tick() => {}
        }

        if session.state().is_terminal() {
            break;
        }

        match session.read(current_time_node(), AttributeId::Value).await {
            Ok(_) => {
                consecutive_recovery_failures = 0;
                log_activity(&session, &KeepAliveActivity::Succeeded);
            }
            Err(_) => match recovery::attempt(&session).await {
                Ok(()) => {
                    consecutive_recovery_failures = 0;
                    log_activity(&session, &KeepAliveActivity::Succeeded);
                }
                Err(e) => {
                    consecutive_recovery_failures += 1;
                    log_activity(&session, &KeepAliveActivity::Failed(error_status(&e)));
                    session_warn!(
                        session,
                        "keep-alive recovery failed ({consecutive_recovery_failures}/{max_consecutive_recovery_failures}): {e}"
                    );
                    if consecutive_recovery_failures >= max_consecutive_recovery_failures {
                        session_warn!(session, "backing off keep-alive for {BACKOFF_WINDOW:?}");
                        tokio::select! {
                            _ = session.inner.keep_alive_cancel.notified() => break,
                            _ = tokio::time::sleep(BACKOFF_WINDOW) => {}
                        }
                        consecutive_recovery_failures = 0;
                    }
                }
            },
        }

        if session.state().is_terminal() {
            break;
        }
    }
}
