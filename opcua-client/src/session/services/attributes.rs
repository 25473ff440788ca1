// SPDX-License-Identifier: MPL-2.0

//! `Read` and `Write`: thin facades over the attribute read/write service.

use opcua_core::error::{ErrorKind, OpcUaError};
use opcua_core::transport::{ServiceRequest, ServiceResponse};
use opcua_types::{AttributeId, DataValue, NodeId, QualifiedName, ReadValueId, Variant};

use crate::session::request::DEFAULT_REQUEST_TIMEOUT;
use crate::session::Session;

impl Session {
    /// Read a single node attribute, with default timestamps and no index range.
    pub async fn read(
        &self,
        node_id: NodeId,
        attribute_id: AttributeId,
    ) -> Result<DataValue, OpcUaError> {
        self.ensure_activated().await?;
        let request = ServiceRequest::Read {
            nodes_to_read: vec![ReadValueId {
                node_id,
                attribute_id,
                index_range: String::new(),
                data_encoding: QualifiedName::null(),
            }],
            timestamps_to_return: Default::default(),
        };
        match self.send(request, DEFAULT_REQUEST_TIMEOUT).await? {
            ServiceResponse::Read { mut results } if results.len() == 1 => {
                let value = results.remove(0);
                match OpcUaError::from_service_result(value.status) {
                    Some(e) if e.kind() == ErrorKind::SessionInvalidated => Err(e),
                    _ => Ok(value),
                }
            }
            ServiceResponse::Read { .. } => Err(OpcUaError::Protocol(
                "Read returned an unexpected number of results".to_string(),
            )),
            _ => Err(OpcUaError::Protocol(
                "unexpected response to Read".to_string(),
            )),
        }
    }

    /// Write a single node attribute.
    pub async fn write(
        &self,
        node_id: NodeId,
        attribute_id: AttributeId,
        value: Variant,
    ) -> Result<(), OpcUaError> {
        self.ensure_activated().await?;
        let read_id = ReadValueId {
            node_id,
            attribute_id,
            index_range: String::new(),
            data_encoding: QualifiedName::null(),
        };
        let request = ServiceRequest::Write {
            nodes_to_write: vec![(read_id, DataValue::new_now(value))],
        };
        match self.send(request, DEFAULT_REQUEST_TIMEOUT).await? {
            ServiceResponse::Write { results } if results.len() == 1 => {
                if results[0].is_good() {
                    Ok(())
                } else {
                    Err(OpcUaError::from(results[0]))
                }
            }
            ServiceResponse::Write { .. } => Err(OpcUaError::Protocol(
                "Write returned an unexpected number of results".to_string(),
            )),
            _ => Err(OpcUaError::Protocol(
                "unexpected response to Write".to_string(),
            )),
        }
    }
}
