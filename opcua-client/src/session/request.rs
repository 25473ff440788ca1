// SPDX-License-Identifier: MPL-2.0

//! Deadline enforcement for individual service requests.

use std::time::Duration;

use opcua_core::error::OpcUaError;

/// Default deadline for most service requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for `Call`, which may run server-side logic.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Run `fut` under `deadline`. On timeout, `fut` is dropped (the Transport is
/// expected to free its pending response slot when its request future is
/// dropped); the caller receives `OpcUaError::Timeout`, and any response that
/// arrives later is discarded because nothing is left awaiting it.
pub(crate) async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T, OpcUaError>
where
    F: std::future::Future<Output = Result<T, OpcUaError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(OpcUaError::Timeout),
    }
}
