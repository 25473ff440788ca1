// SPDX-License-Identifier: MPL-2.0

//! `Variant` - the tagged union used for attribute values and method arguments.

use std::fmt;

use crate::{node_id::NodeId, status_code::StatusCode};

/// The scalar type tag of a [`Variant`], used to describe a method argument's
/// declared data type when widening caller-supplied numeric values.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
#[allow(missing_docs)]
pub enum VariantScalarTypeId {
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    String,
    NodeId,
    StatusCode,
}

/// Error returned when a [`Variant`] cannot be converted or widened to a target type.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantTypeMismatch {
    /// The scalar type the caller asked for.
    pub expected: VariantScalarTypeId,
    /// The variant that could not be converted.
    pub found: String,
}

impl fmt::Display for VariantTypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "expected a value convertible to {:?}, found {}",
            self.expected, self.found
        )
    }
}

impl std::error::Error for VariantTypeMismatch {}

impl VariantTypeMismatch {
    /// The status code this mismatch should be surfaced to the caller as.
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_TYPE_MISMATCH
    }
}

/// A dynamically typed value, used for attribute values and method call arguments.
#[derive(PartialEq, Clone, Debug)]
#[allow(missing_docs)]
pub enum Variant {
    Empty,
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    NodeId(Box<NodeId>),
    StatusCode(StatusCode),
    Array(Vec<Variant>),
}

macro_rules! impl_from_scalar {
    ($t:ty, $variant:ident) => {
        impl From<$t> for Variant {
            fn from(v: $t) -> Self {
                Variant::$variant(v)
            }
        }
    };
}

impl_from_scalar!(bool, Boolean);
impl_from_scalar!(i8, SByte);
impl_from_scalar!(u8, Byte);
impl_from_scalar!(i16, Int16);
impl_from_scalar!(u16, UInt16);
impl_from_scalar!(i32, Int32);
impl_from_scalar!(u32, UInt32);
impl_from_scalar!(i64, Int64);
impl_from_scalar!(u64, UInt64);
impl_from_scalar!(f32, Float);
impl_from_scalar!(f64, Double);
impl_from_scalar!(String, String);

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_string())
    }
}

impl From<NodeId> for Variant {
    fn from(v: NodeId) -> Self {
        Variant::NodeId(Box::new(v))
    }
}

impl Variant {
    /// The scalar type tag of this variant, if it has a direct numeric/string/etc. type.
    /// `Empty` and `Array` have no scalar type tag.
    pub fn scalar_type(&self) -> Option<VariantScalarTypeId> {
        use VariantScalarTypeId as T;
        Some(match self {
            Variant::Empty | Variant::Array(_) => return None,
            Variant::Boolean(_) => T::Boolean,
            Variant::SByte(_) => T::SByte,
            Variant::Byte(_) => T::Byte,
            Variant::Int16(_) => T::Int16,
            Variant::UInt16(_) => T::UInt16,
            Variant::Int32(_) => T::Int32,
            Variant::UInt32(_) => T::UInt32,
            Variant::Int64(_) => T::Int64,
            Variant::UInt64(_) => T::UInt64,
            Variant::Float(_) => T::Float,
            Variant::Double(_) => T::Double,
            Variant::String(_) => T::String,
            Variant::NodeId(_) => T::NodeId,
            Variant::StatusCode(_) => T::StatusCode,
        })
    }

    /// Widen this variant's numeric value to the given target scalar type, without loss
    /// of information, as `Session::call` does for method input arguments whose server-declared
    /// data type is wider than what the caller supplied (e.g. caller passes `Int32`, server
    /// expects `Int64` or `Double`).
    ///
    /// Non-numeric variants (and any target that is not itself numeric) are returned
    /// unchanged if they already match, or rejected with [`VariantTypeMismatch`].
    pub fn widen_to(self, target: VariantScalarTypeId) -> Result<Variant, VariantTypeMismatch> {
        use VariantScalarTypeId as T;

        if self.scalar_type() == Some(target) {
            return Ok(self);
        }

        let as_i64 = self.as_widening_i64();
        let as_f64 = self.as_widening_f64();

        let widened = match (target, as_i64, as_f64) {
            (T::Int16, Some(v), _) if i16::try_from(v).is_ok() => {
                Some(Variant::Int16(v as i16))
            }
            (T::UInt16, Some(v), _) if u16::try_from(v).is_ok() => {
                Some(Variant::UInt16(v as u16))
            }
            (T::Int32, Some(v), _) if i32::try_from(v).is_ok() => {
                Some(Variant::Int32(v as i32))
            }
            (T::UInt32, Some(v), _) if u32::try_from(v).is_ok() => {
                Some(Variant::UInt32(v as u32))
            }
            (T::Int64, Some(v), _) => Some(Variant::Int64(v)),
            (T::UInt64, Some(v), _) if v >= 0 => Some(Variant::UInt64(v as u64)),
            (T::Float, _, Some(v)) => Some(Variant::Float(v as f32)),
            (T::Double, _, Some(v)) => Some(Variant::Double(v)),
            _ => None,
        };

        widened.ok_or_else(|| VariantTypeMismatch {
            expected: target,
            found: format!("{self:?}"),
        })
    }

    fn as_widening_i64(&self) -> Option<i64> {
        match self {
            Variant::SByte(v) => Some(*v as i64),
            Variant::Byte(v) => Some(*v as i64),
            Variant::Int16(v) => Some(*v as i64),
            Variant::UInt16(v) => Some(*v as i64),
            Variant::Int32(v) => Some(*v as i64),
            Variant::UInt32(v) => Some(*v as i64),
            Variant::Int64(v) => Some(*v),
            Variant::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    fn as_widening_f64(&self) -> Option<f64> {
        match self {
            Variant::Float(v) => Some(*v as f64),
            Variant::Double(v) => Some(*v),
            _ => self.as_widening_i64().map(|v| v as f64),
        }
    }
}
