//! SNMP value types.
//!
//! [`ValueType`] is the closed set of data types a varbind can carry, and
//! [`Value`] is a decoded or caller-built value of one of them. Each type has
//! exactly one encode rule and one decode rule, keyed by its BER tag.

use std::fmt;
use std::net::Ipv4Addr;

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{Error, Result};
use crate::oid::Oid;

/// SNMP data type, one per wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Boolean,
    Integer,
    OctetString,
    Null,
    ObjectIdentifier,
    IpAddress,
    Counter32,
    Gauge32,
    TimeTicks,
    Opaque,
    Counter64,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

impl ValueType {
    /// The BER tag for this type.
    pub const fn tag(self) -> u8 {
        match self {
            Self::Boolean => tag::universal::BOOLEAN,
            Self::Integer => tag::universal::INTEGER,
            Self::OctetString => tag::universal::OCTET_STRING,
            Self::Null => tag::universal::NULL,
            Self::ObjectIdentifier => tag::universal::OBJECT_IDENTIFIER,
            Self::IpAddress => tag::application::IP_ADDRESS,
            Self::Counter32 => tag::application::COUNTER32,
            Self::Gauge32 => tag::application::GAUGE32,
            Self::TimeTicks => tag::application::TIMETICKS,
            Self::Opaque => tag::application::OPAQUE,
            Self::Counter64 => tag::application::COUNTER64,
            Self::NoSuchObject => tag::context::NO_SUCH_OBJECT,
            Self::NoSuchInstance => tag::context::NO_SUCH_INSTANCE,
            Self::EndOfMibView => tag::context::END_OF_MIB_VIEW,
        }
    }

    /// Look up the type for a BER tag.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            tag::universal::BOOLEAN => Self::Boolean,
            tag::universal::INTEGER => Self::Integer,
            tag::universal::OCTET_STRING => Self::OctetString,
            tag::universal::NULL => Self::Null,
            tag::universal::OBJECT_IDENTIFIER => Self::ObjectIdentifier,
            tag::application::IP_ADDRESS => Self::IpAddress,
            tag::application::COUNTER32 => Self::Counter32,
            tag::application::GAUGE32 => Self::Gauge32,
            tag::application::TIMETICKS => Self::TimeTicks,
            tag::application::OPAQUE => Self::Opaque,
            tag::application::COUNTER64 => Self::Counter64,
            tag::context::NO_SUCH_OBJECT => Self::NoSuchObject,
            tag::context::NO_SUCH_INSTANCE => Self::NoSuchInstance,
            tag::context::END_OF_MIB_VIEW => Self::EndOfMibView,
            _ => return None,
        })
    }

    /// Whether this is one of the payload-less v2c exception markers.
    pub const fn is_exception(self) -> bool {
        matches!(
            self,
            Self::NoSuchObject | Self::NoSuchInstance | Self::EndOfMibView
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "BOOLEAN",
            Self::Integer => "INTEGER",
            Self::OctetString => "OCTET STRING",
            Self::Null => "NULL",
            Self::ObjectIdentifier => "OBJECT IDENTIFIER",
            Self::IpAddress => "IpAddress",
            Self::Counter32 => "Counter32",
            Self::Gauge32 => "Gauge32",
            Self::TimeTicks => "TimeTicks",
            Self::Opaque => "Opaque",
            Self::Counter64 => "Counter64",
            Self::NoSuchObject => "noSuchObject",
            Self::NoSuchInstance => "noSuchInstance",
            Self::EndOfMibView => "endOfMibView",
        };
        f.write_str(name)
    }
}

/// SNMP value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// BOOLEAN (universal tag 1)
    Boolean(bool),

    /// INTEGER (signed 32-bit)
    Integer(i32),

    /// OCTET STRING (arbitrary bytes, often text)
    OctetString(Bytes),

    /// NULL, also the placeholder value in request varbinds
    Null,

    /// OBJECT IDENTIFIER
    ObjectIdentifier(Oid),

    /// IpAddress (4 bytes, network order)
    IpAddress([u8; 4]),

    /// Counter32 (unsigned 32-bit, wrapping)
    Counter32(u32),

    /// Gauge32 / Unsigned32
    Gauge32(u32),

    /// TimeTicks (hundredths of a second)
    TimeTicks(u32),

    /// Opaque (legacy wrapper, decoded as raw bytes)
    Opaque(Bytes),

    /// Counter64 (unsigned 64-bit, v2c only)
    Counter64(u64),

    /// noSuchObject exception marker
    NoSuchObject,

    /// noSuchInstance exception marker
    NoSuchInstance,

    /// endOfMibView exception marker
    EndOfMibView,
}

/// Loosely typed caller input for [`Value::coerce`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Bytes),
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<u32> for RawValue {
    fn from(v: u32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&[u8]> for RawValue {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(v))
    }
}

impl From<Bytes> for RawValue {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl RawValue {
    fn truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0 && !f.is_nan(),
            Self::Text(s) => !s.is_empty(),
            Self::Bytes(b) => !b.is_empty(),
        }
    }

    /// Truncate toward zero and wrap into 32 bits.
    fn to_int32(&self, value_type: ValueType) -> Result<i32> {
        let wide = match self {
            Self::Bool(b) => i64::from(*b),
            Self::Int(i) => *i,
            Self::Float(f) if f.is_finite() => f.trunc() as i64,
            Self::Float(_) => 0,
            Self::Text(s) => {
                let s = s.trim();
                match s.parse::<i64>() {
                    Ok(i) => i,
                    Err(_) => match s.parse::<f64>() {
                        Ok(f) if f.is_finite() => f.trunc() as i64,
                        _ => return Err(Error::invalid_value(value_type, "not a number")),
                    },
                }
            }
            Self::Bytes(_) => return Err(Error::invalid_value(value_type, "expected a number")),
        };
        Ok(wide as i32)
    }
}

impl Value {
    /// The data type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) => ValueType::Integer,
            Value::OctetString(_) => ValueType::OctetString,
            Value::Null => ValueType::Null,
            Value::ObjectIdentifier(_) => ValueType::ObjectIdentifier,
            Value::IpAddress(_) => ValueType::IpAddress,
            Value::Counter32(_) => ValueType::Counter32,
            Value::Gauge32(_) => ValueType::Gauge32,
            Value::TimeTicks(_) => ValueType::TimeTicks,
            Value::Opaque(_) => ValueType::Opaque,
            Value::Counter64(_) => ValueType::Counter64,
            Value::NoSuchObject => ValueType::NoSuchObject,
            Value::NoSuchInstance => ValueType::NoSuchInstance,
            Value::EndOfMibView => ValueType::EndOfMibView,
        }
    }

    /// Build a value of `value_type` from loosely typed input.
    ///
    /// Integer-shaped types truncate toward zero and wrap into 32 bits.
    /// Counter32, Gauge32 and TimeTicks keep the wrapped bit pattern.
    ///
    /// ```
    /// use snmp_engine::value::{Value, ValueType};
    ///
    /// assert_eq!(Value::coerce(ValueType::Integer, 41.9).unwrap(), Value::Integer(41));
    /// assert_eq!(Value::coerce(ValueType::Boolean, "yes").unwrap(), Value::Boolean(true));
    /// assert_eq!(
    ///     Value::coerce(ValueType::IpAddress, "192.168.1.1").unwrap(),
    ///     Value::IpAddress([192, 168, 1, 1])
    /// );
    /// assert!(Value::coerce(ValueType::Opaque, "x").is_err());
    /// ```
    pub fn coerce(value_type: ValueType, raw: impl Into<RawValue>) -> Result<Self> {
        let raw = raw.into();
        let value = match value_type {
            ValueType::Boolean => Value::Boolean(raw.truthy()),
            ValueType::Integer => Value::Integer(raw.to_int32(value_type)?),
            ValueType::Counter32 => Value::Counter32(raw.to_int32(value_type)? as u32),
            ValueType::Gauge32 => Value::Gauge32(raw.to_int32(value_type)? as u32),
            ValueType::TimeTicks => Value::TimeTicks(raw.to_int32(value_type)? as u32),
            ValueType::OctetString => match raw {
                RawValue::Text(s) => Value::OctetString(Bytes::from(s)),
                RawValue::Bytes(b) => Value::OctetString(b),
                _ => return Err(Error::invalid_value(value_type, "expected text or bytes")),
            },
            ValueType::Null => Value::Null,
            ValueType::ObjectIdentifier => match raw {
                RawValue::Text(s) => Value::ObjectIdentifier(Oid::parse(&s)?),
                _ => return Err(Error::invalid_value(value_type, "expected dotted text")),
            },
            ValueType::IpAddress => match raw {
                RawValue::Text(s) => {
                    let addr: Ipv4Addr = s
                        .trim()
                        .parse()
                        .map_err(|_| Error::invalid_value(value_type, "expected a dotted quad"))?;
                    Value::IpAddress(addr.octets())
                }
                RawValue::Bytes(b) if b.len() == 4 => Value::IpAddress([b[0], b[1], b[2], b[3]]),
                _ => return Err(Error::invalid_value(value_type, "expected a dotted quad")),
            },
            ValueType::Counter64 => match raw {
                RawValue::Int(i) => Value::Counter64(
                    u64::try_from(i).map_err(|_| Error::invalid_value(value_type, "negative"))?,
                ),
                RawValue::Float(f) if f.is_finite() && f >= 0.0 => Value::Counter64(f.trunc() as u64),
                RawValue::Text(s) => Value::Counter64(
                    s.trim()
                        .parse()
                        .map_err(|_| Error::invalid_value(value_type, "not an unsigned integer"))?,
                ),
                _ => return Err(Error::invalid_value(value_type, "expected an unsigned integer")),
            },
            ValueType::Opaque
            | ValueType::NoSuchObject
            | ValueType::NoSuchInstance
            | ValueType::EndOfMibView => return Err(Error::UnsupportedType { value_type }),
        };
        Ok(value)
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as u32 (Counter32, Gauge32, TimeTicks, or non-negative Integer).
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v),
            Value::Integer(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Get as u64 (Counter64 or any u32-compatible value).
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Counter64(v) => Some(*v),
            other => other.as_u32().map(u64::from),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the raw bytes of an OctetString or Opaque.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(data) | Value::Opaque(data) => Some(data),
            _ => None,
        }
    }

    /// Get an OctetString as UTF-8 text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::OctetString(data) => std::str::from_utf8(data).ok(),
            _ => None,
        }
    }

    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    pub fn as_ip(&self) -> Option<Ipv4Addr> {
        match self {
            Value::IpAddress(octets) => Some(Ipv4Addr::from(*octets)),
            _ => None,
        }
    }

    /// Whether this is an exception marker (noSuchObject, noSuchInstance,
    /// endOfMibView) rather than a real value.
    pub fn is_exception(&self) -> bool {
        self.value_type().is_exception()
    }

    /// Encode to BER.
    ///
    /// Opaque payloads and exception markers are agent-side constructs and
    /// fail with [`Error::UnsupportedType`].
    pub fn encode(&self, buf: &mut EncodeBuf) -> Result<()> {
        match self {
            Value::Boolean(v) => buf.push_boolean(*v),
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(*addr),
            Value::Counter32(v) => buf.push_unsigned32(tag::application::COUNTER32, *v),
            Value::Gauge32(v) => buf.push_unsigned32(tag::application::GAUGE32, *v),
            Value::TimeTicks(v) => buf.push_unsigned32(tag::application::TIMETICKS, *v),
            Value::Counter64(v) => buf.push_integer64(*v),
            Value::Opaque(_)
            | Value::NoSuchObject
            | Value::NoSuchInstance
            | Value::EndOfMibView => {
                return Err(Error::UnsupportedType {
                    value_type: self.value_type(),
                });
            }
        }
        Ok(())
    }

    /// Decode from BER.
    ///
    /// The tag selects the rule; tags outside [`ValueType`] fail with
    /// [`Error::InvalidType`].
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let tag = decoder.read_tag()?;
        let Some(value_type) = ValueType::from_tag(tag) else {
            tracing::debug!(target: "snmp_engine::value", { snmp.offset = decoder.offset() - 1, tag }, "invalid value type tag");
            return Err(Error::InvalidType { tag });
        };
        let len = decoder.read_length()?;

        let value = match value_type {
            ValueType::Boolean => Value::Boolean(decoder.read_boolean_value(len)?),
            ValueType::Integer => Value::Integer(decoder.read_integer_value(len)?),
            ValueType::OctetString => Value::OctetString(decoder.read_bytes(len)?),
            ValueType::Null => {
                // Permissive: skip any stray content
                decoder.read_bytes(len)?;
                Value::Null
            }
            ValueType::ObjectIdentifier => Value::ObjectIdentifier(decoder.read_oid_value(len)?),
            ValueType::IpAddress => {
                if len != 4 {
                    return Err(Error::decode(
                        decoder.offset(),
                        crate::error::DecodeErrorKind::InvalidIpAddressLength { length: len },
                    ));
                }
                let data = decoder.read_bytes(4)?;
                Value::IpAddress([data[0], data[1], data[2], data[3]])
            }
            ValueType::Counter32 => Value::Counter32(decoder.read_unsigned32_value(len)?),
            ValueType::Gauge32 => Value::Gauge32(decoder.read_unsigned32_value(len)?),
            ValueType::TimeTicks => Value::TimeTicks(decoder.read_unsigned32_value(len)?),
            ValueType::Opaque => Value::Opaque(decoder.read_bytes(len)?),
            ValueType::Counter64 => Value::Counter64(decoder.read_integer64_value(len)?),
            ValueType::NoSuchObject | ValueType::NoSuchInstance | ValueType::EndOfMibView => {
                decoder.read_bytes(len)?;
                match value_type {
                    ValueType::NoSuchObject => Value::NoSuchObject,
                    ValueType::NoSuchInstance => Value::NoSuchInstance,
                    _ => Value::EndOfMibView,
                }
            }
        };
        Ok(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => match std::str::from_utf8(data) {
                Ok(s) => f.write_str(s),
                Err(_) => write_hex(f, data),
            },
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(addr) => write!(f, "{}", Ipv4Addr::from(*addr)),
            Value::Counter32(v) | Value::Gauge32(v) => write!(f, "{}", v),
            Value::TimeTicks(v) => {
                let secs = v / 100;
                write!(
                    f,
                    "{}d {}h {}m {}s",
                    secs / 86400,
                    (secs % 86400) / 3600,
                    (secs % 3600) / 60,
                    secs % 60
                )
            }
            Value::Opaque(data) => {
                f.write_str("Opaque(")?;
                write_hex(f, data)?;
                f.write_str(")")
            }
            Value::Counter64(v) => write!(f, "{}", v),
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
        }
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, data: &[u8]) -> fmt::Result {
    f.write_str("0x")?;
    data.iter().try_for_each(|b| write!(f, "{:02x}", b))
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl From<&[u8]> for Value {
    fn from(data: &[u8]) -> Self {
        Value::OctetString(Bytes::copy_from_slice(data))
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<Ipv4Addr> for Value {
    fn from(addr: Ipv4Addr) -> Self {
        Value::IpAddress(addr.octets())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Counter64(v)
    }
}
