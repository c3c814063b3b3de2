use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// One-byte type tag identifying an entry's value on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValueType {
    /// No valid type. Never produced for a live entry.
    Unknown = 0,
    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    UInt8 = 4,
    UInt16 = 5,
    UInt32 = 6,
    Float32 = 7,
    String = 8,
}

impl ValueType {
    /// All tags that describe a storable value, in tag order.
    pub const STORABLE: [ValueType; 8] = [
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::Float32,
        Self::String,
    ];

    /// The tag byte written to the binary format.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Parse a tag byte. Tag 0 parses as [`ValueType::Unknown`].
    pub fn from_tag(tag: u8) -> Result<Self, TypeError> {
        match tag {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Int8),
            2 => Ok(Self::Int16),
            3 => Ok(Self::Int32),
            4 => Ok(Self::UInt8),
            5 => Ok(Self::UInt16),
            6 => Ok(Self::UInt32),
            7 => Ok(Self::Float32),
            8 => Ok(Self::String),
            other => Err(TypeError::UnknownTag(other)),
        }
    }

    /// Returns `true` for every tag except [`ValueType::Unknown`].
    pub fn is_storable(self) -> bool {
        self != Self::Unknown
    }

    /// Human-readable type name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Int8 => "Signed Byte",
            Self::Int16 => "Signed Short",
            Self::Int32 => "Signed Integer",
            Self::UInt8 => "Unsigned Byte",
            Self::UInt16 => "Unsigned Short",
            Self::UInt32 => "Unsigned Integer",
            Self::Float32 => "Floating-Point Number",
            Self::String => "String Literal",
        }
    }
}

impl TryFrom<u8> for ValueType {
    type Error = TypeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::from_tag(tag)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A primitive value held by a registry entry.
///
/// The set of variants is closed; every variant maps to exactly one storable
/// [`ValueType`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    Float32(f32),
    Str(String),
}

impl Value {
    /// The tag describing this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int8(_) => ValueType::Int8,
            Self::Int16(_) => ValueType::Int16,
            Self::Int32(_) => ValueType::Int32,
            Self::UInt8(_) => ValueType::UInt8,
            Self::UInt16(_) => ValueType::UInt16,
            Self::UInt32(_) => ValueType::UInt32,
            Self::Float32(_) => ValueType::Float32,
            Self::Str(_) => ValueType::String,
        }
    }

    /// The zero value for `ty`, or `None` for [`ValueType::Unknown`].
    pub fn zero(ty: ValueType) -> Option<Self> {
        match ty {
            ValueType::Unknown => None,
            ValueType::Int8 => Some(Self::Int8(0)),
            ValueType::Int16 => Some(Self::Int16(0)),
            ValueType::Int32 => Some(Self::Int32(0)),
            ValueType::UInt8 => Some(Self::UInt8(0)),
            ValueType::UInt16 => Some(Self::UInt16(0)),
            ValueType::UInt32 => Some(Self::UInt32(0)),
            ValueType::Float32 => Some(Self::Float32(0.0)),
            ValueType::String => Some(Self::Str(String::new())),
        }
    }

    /// Bitwise equality: like `==`, but floats compare by bit pattern so
    /// NaN payloads and signed zeros are distinguished.
    pub fn bit_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float32(a), Self::Float32(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

/// A Rust type that can be stored in a registry entry.
///
/// Implemented for `i8`, `i16`, `i32`, `u8`, `u16`, `u32`, `f32` and
/// `String`. Typed entry access is generic over this trait; the tag check
/// happens against [`Primitive::TYPE`] and the payload is reached through
/// an exhaustive match, never a cast.
pub trait Primitive: Clone + Default + fmt::Debug + 'static {
    /// The tag for this type.
    const TYPE: ValueType;

    /// Borrow the payload if `value` holds this type.
    fn from_value(value: &Value) -> Option<&Self>;

    /// Mutably borrow the payload if `value` holds this type.
    fn from_value_mut(value: &mut Value) -> Option<&mut Self>;

    /// Wrap into a [`Value`].
    fn into_value(self) -> Value;
}

macro_rules! impl_primitive {
    ($ty:ty, $variant:ident, $tag:ident) => {
        impl Primitive for $ty {
            const TYPE: ValueType = ValueType::$tag;

            fn from_value(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_primitive!(i8, Int8, Int8);
impl_primitive!(i16, Int16, Int16);
impl_primitive!(i32, Int32, Int32);
impl_primitive!(u8, UInt8, UInt8);
impl_primitive!(u16, UInt16, UInt16);
impl_primitive!(u32, UInt32, UInt32);
impl_primitive!(f32, Float32, Float32);
impl_primitive!(String, Str, String);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tags_match_wire_table() {
        assert_eq!(ValueType::Unknown.tag(), 0);
        assert_eq!(ValueType::Int8.tag(), 1);
        assert_eq!(ValueType::Int16.tag(), 2);
        assert_eq!(ValueType::Int32.tag(), 3);
        assert_eq!(ValueType::UInt8.tag(), 4);
        assert_eq!(ValueType::UInt16.tag(), 5);
        assert_eq!(ValueType::UInt32.tag(), 6);
        assert_eq!(ValueType::Float32.tag(), 7);
        assert_eq!(ValueType::String.tag(), 8);
    }

    #[test]
    fn from_tag_unknown_bytes() {
        assert_eq!(ValueType::from_tag(9), Err(TypeError::UnknownTag(9)));
        assert_eq!(ValueType::try_from(255), Err(TypeError::UnknownTag(255)));
        assert_eq!(ValueType::from_tag(0), Ok(ValueType::Unknown));
    }

    #[test]
    fn storable_excludes_unknown() {
        assert!(!ValueType::STORABLE.contains(&ValueType::Unknown));
        assert!(ValueType::STORABLE.iter().all(|t| t.is_storable()));
    }

    #[test]
    fn zero_values_carry_their_type() {
        for ty in ValueType::STORABLE {
            let zero = Value::zero(ty).unwrap();
            assert_eq!(zero.value_type(), ty);
        }
        assert!(Value::zero(ValueType::Unknown).is_none());
    }

    #[test]
    fn type_names() {
        assert_eq!(ValueType::Int32.to_string(), "Signed Integer");
        assert_eq!(ValueType::Float32.name(), "Floating-Point Number");
        assert_eq!(ValueType::Unknown.name(), "Unknown");
    }

    #[test]
    fn display_renders_payload() {
        assert_eq!(Value::Int32(-1920).to_string(), "-1920");
        assert_eq!(Value::UInt8(255).to_string(), "255");
        assert_eq!(Value::Float32(1.5).to_string(), "1.5");
        assert_eq!(Value::from("hello").to_string(), "hello");
    }

    #[test]
    fn primitive_access_checks_variant() {
        let mut v = 7i32.into_value();
        assert_eq!(i32::from_value(&v), Some(&7));
        assert!(f32::from_value(&v).is_none());
        *i32::from_value_mut(&mut v).unwrap() = 9;
        assert_eq!(v, Value::Int32(9));
    }

    #[test]
    fn bit_eq_distinguishes_signed_zero() {
        assert_eq!(Value::Float32(0.0), Value::Float32(-0.0));
        assert!(!Value::Float32(0.0).bit_eq(&Value::Float32(-0.0)));
        assert!(Value::Float32(f32::NAN).bit_eq(&Value::Float32(f32::NAN)));
    }

    #[test]
    fn serde_json_shape() {
        let json = serde_json::to_string(&Value::UInt16(80)).unwrap();
        assert_eq!(json, r#"{"type":"UInt16","value":80}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::UInt16(80));
    }

    proptest! {
        #[test]
        fn tag_parse_is_inverse(tag in 0u8..=8) {
            prop_assert_eq!(ValueType::from_tag(tag).unwrap().tag(), tag);
        }
    }
}
