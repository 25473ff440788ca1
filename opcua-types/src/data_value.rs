// SPDX-License-Identifier: MPL-2.0

//! `DataValue` - a value together with its status and source/server timestamps.

use chrono::{DateTime, Utc};

use crate::{status_code::StatusCode, variant::Variant};

/// A point in time, as reported by the server or recorded locally on receipt.
pub type Timestamp = DateTime<Utc>;

/// A value read from, or delivered for, a node attribute, together with the
/// status of the read/monitored item and the timestamps the server attached to it.
#[derive(PartialEq, Clone, Debug)]
pub struct DataValue {
    /// The value itself. `None` if the status is bad and no value was returned.
    pub value: Option<Variant>,
    /// The status of the value.
    pub status: StatusCode,
    /// When the value was generated at the source (device/sensor), if known.
    pub source_timestamp: Option<Timestamp>,
    /// When the server recorded the value, if known.
    pub server_timestamp: Option<Timestamp>,
}

impl DataValue {
    /// Construct a `DataValue` carrying a good value with no timestamps set.
    pub fn new_now(value: impl Into<Variant>) -> Self {
        Self {
            value: Some(value.into()),
            status: StatusCode::GOOD,
            source_timestamp: Some(Utc::now()),
            server_timestamp: Some(Utc::now()),
        }
    }

    /// Construct a `DataValue` carrying only a status code, e.g. for a failed read.
    pub fn from_status(status: StatusCode) -> Self {
        Self {
            value: None,
            status,
            source_timestamp: None,
            server_timestamp: None,
        }
    }
}
