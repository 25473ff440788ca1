// SPDX-License-Identifier: MPL-2.0

//! `Browse`: a thin facade over the address-space browse service.

use opcua_core::error::OpcUaError;
use opcua_core::transport::{ServiceRequest, ServiceResponse};
use opcua_types::{BrowseDirection, NodeId, ReferenceDescription};

use crate::session::request::DEFAULT_REQUEST_TIMEOUT;
use crate::session::Session;

/// Default cap on references returned by a single `browse` call.
const DEFAULT_MAX_REFERENCES: u32 = 1_000;

impl Session {
    /// Browse the references of `node_id` in `direction`, optionally restricted
    /// to a single reference type.
    pub async fn browse(
        &self,
        node_id: NodeId,
        direction: BrowseDirection,
        reference_type_filter: Option<NodeId>,
    ) -> Result<Vec<ReferenceDescription>, OpcUaError> {
        self.ensure_activated().await?;
        let request = ServiceRequest::Browse {
            node_id,
            direction,
            reference_type_id: reference_type_filter,
            max_references: DEFAULT_MAX_REFERENCES,
        };
        match self.send(request, DEFAULT_REQUEST_TIMEOUT).await? {
            ServiceResponse::Browse { references } => Ok(references),
            _ => Err(OpcUaError::Protocol(
                "unexpected response to Browse".to_string(),
            )),
        }
    }
}
