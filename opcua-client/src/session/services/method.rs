// SPDX-License-Identifier: MPL-2.0

//! `Call`: invoke a method node, widening numeric input arguments to the
//! method's declared input argument data types before sending them.

use opcua_core::error::OpcUaError;
use opcua_core::transport::{ServiceRequest, ServiceResponse};
use opcua_types::{
    AttributeId, BrowseDirection, Identifier, NodeId, Variant, VariantScalarTypeId,
};

use crate::session::session::CALL_TIMEOUT;
use crate::session::Session;

/// Map a builtin OPC UA data type NodeId (namespace 0) to the [`VariantScalarTypeId`]
/// it corresponds to, for the scalar types this core's `Variant` represents.
fn builtin_scalar_type(node_id: &NodeId) -> Option<VariantScalarTypeId> {
    if node_id.namespace != 0 {
        return None;
    }
    let Identifier::Numeric(id) = node_id.identifier else {
        return None;
    };
    Some(match id {
        1 => VariantScalarTypeId::Boolean,
        2 => VariantScalarTypeId::SByte,
        3 => VariantScalarTypeId::Byte,
        4 => VariantScalarTypeId::Int16,
        5 => VariantScalarTypeId::UInt16,
        6 => VariantScalarTypeId::Int32,
        7 => VariantScalarTypeId::UInt32,
        8 => VariantScalarTypeId::Int64,
        9 => VariantScalarTypeId::UInt64,
        10 => VariantScalarTypeId::Float,
        11 => VariantScalarTypeId::Double,
        12 => VariantScalarTypeId::String,
        17 => VariantScalarTypeId::NodeId,
        19 => VariantScalarTypeId::StatusCode,
        _ => return None,
    })
}

impl Session {
    /// Call a method on `object_id`, widening `input_arguments` to the method's
    /// declared input argument types where those can be discovered, then
    /// invoking it. If the argument types cannot be discovered (no
    /// `InputArguments` property, or a non-builtin argument type), arguments
    /// are sent unchanged.
    pub async fn call(
        &self,
        object_id: NodeId,
        method_id: NodeId,
        input_arguments: Vec<Variant>,
    ) -> Result<Vec<Variant>, OpcUaError> {
        self.ensure_activated().await?;

        let declared_types = self
            .declared_input_argument_types(&method_id)
            .await
            .unwrap_or_default();
        let input_arguments = widen_arguments(input_arguments, &declared_types)?;

        let request = ServiceRequest::Call {
            object_id,
            method_id,
            input_arguments,
        };
        match self.send(request, CALL_TIMEOUT).await? {
            ServiceResponse::Call {
                status,
                output_arguments,
            } => {
                if status.is_good() {
                    Ok(output_arguments)
                } else {
                    Err(OpcUaError::from(status))
                }
            }
            _ => Err(OpcUaError::Protocol(
                "unexpected response to Call".to_string(),
            )),
        }
    }

    /// Best-effort discovery of a method's declared input argument types, via
    /// its `InputArguments` property. Returns an empty vec if the property is
    /// absent or cannot be interpreted.
    async fn declared_input_argument_types(
        &self,
        method_id: &NodeId,
    ) -> Result<Vec<VariantScalarTypeId>, OpcUaError> {
        let references = self
            .browse(method_id.clone(), BrowseDirection::Forward, None)
            .await?;
        let Some(property) = references
            .into_iter()
            .find(|r| r.browse_name.name == "InputArguments")
        else {
            return Ok(Vec::new());
        };
        let value = self.read(property.node_id, AttributeId::Value).await?;
        let Some(Variant::Array(items)) = value.value else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Variant::NodeId(node_id) => builtin_scalar_type(&node_id),
                _ => None,
            })
            .collect())
    }
}

/// Widen each argument to its declared type. If the declared type list doesn't
/// line up with the argument count (property missing, partially decoded),
/// arguments pass through unchanged rather than failing the call outright.
fn widen_arguments(
    args: Vec<Variant>,
    declared: &[VariantScalarTypeId],
) -> Result<Vec<Variant>, OpcUaError> {
    if declared.len() != args.len() {
        return Ok(args);
    }
    args.into_iter()
        .zip(declared.iter())
        .map(|(value, target)| {
            value
                .widen_to(*target)
                .map_err(|e| OpcUaError::Domain(e.status()))
        })
        .collect()
}
