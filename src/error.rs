//! Error types for snmp-engine.
//!
//! All errors are `#[non_exhaustive]` to allow adding new variants without breaking changes.

use std::net::SocketAddr;
use std::time::Duration;

use crate::oid::Oid;
use crate::pdu::PduType;
use crate::value::ValueType;
use crate::version::Version;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// BER decode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// Expected different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Data truncated unexpectedly.
    TruncatedData,
    /// Indefinite length not supported.
    IndefiniteLength,
    /// Length field too long.
    LengthTooLong { octets: usize },
    /// Length exceeds maximum.
    LengthExceedsMax { length: usize, max: usize },
    /// Insufficient data for read.
    InsufficientData { needed: usize, available: usize },
    /// Integer value overflow.
    IntegerOverflow,
    /// Zero-length integer.
    ZeroLengthInteger,
    /// Integer64 too long.
    Integer64TooLong { length: usize },
    /// BOOLEAN body is not exactly one octet.
    InvalidBooleanLength { length: usize },
    /// NULL with non-zero length.
    InvalidNull,
    /// Invalid IP address length.
    InvalidIpAddressLength { length: usize },
    /// OID exceeds maximum arc count during decode.
    OidTooLong { count: usize, max: usize },
    /// Unknown SNMP version.
    UnknownVersion(i32),
    /// Bytes left over after the outer message sequence.
    TrailingData { length: usize },
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({} octets)", octets)
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {} exceeds maximum {}", length, max)
            }
            Self::InsufficientData { needed, available } => {
                write!(f, "need {} bytes but only {} remaining", needed, available)
            }
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::Integer64TooLong { length } => {
                write!(f, "integer64 too long: {} bytes", length)
            }
            Self::InvalidBooleanLength { length } => {
                write!(f, "BOOLEAN must be 1 byte, got {}", length)
            }
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {}", length)
            }
            Self::OidTooLong { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
            Self::UnknownVersion(v) => write!(f, "unknown SNMP version: {}", v),
            Self::TrailingData { length } => {
                write!(f, "{} trailing bytes after message", length)
            }
        }
    }
}

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Empty OID string.
    Empty,
    /// Invalid arc value.
    InvalidArc,
    /// First arc above 2, or second arc of 40 or more under arcs 0 and 1.
    UnencodableArcs,
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty OID"),
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::UnencodableArcs => write!(f, "leading arcs cannot share one subidentifier"),
        }
    }
}

/// SNMP error status codes (RFC 1157 and RFC 3416).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongLength,
    WrongEncoding,
    WrongValue,
    NoCreation,
    InconsistentValue,
    ResourceUnavailable,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    InconsistentName,
    /// Unknown/future error status code.
    Unknown(i32),
}

impl ErrorStatus {
    const NAMED: [ErrorStatus; 19] = [
        Self::NoError,
        Self::TooBig,
        Self::NoSuchName,
        Self::BadValue,
        Self::ReadOnly,
        Self::GenErr,
        Self::NoAccess,
        Self::WrongType,
        Self::WrongLength,
        Self::WrongEncoding,
        Self::WrongValue,
        Self::NoCreation,
        Self::InconsistentValue,
        Self::ResourceUnavailable,
        Self::CommitFailed,
        Self::UndoFailed,
        Self::AuthorizationError,
        Self::NotWritable,
        Self::InconsistentName,
    ];

    /// Create from raw status code.
    pub fn from_i32(value: i32) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::NAMED.get(i).copied())
            .unwrap_or(Self::Unknown(value))
    }

    /// Convert to raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Unknown(code) => *code,
            named => Self::NAMED
                .iter()
                .position(|s| s == named)
                .map_or(-1, |i| i as i32),
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NoError => "noError",
            Self::TooBig => "tooBig",
            Self::NoSuchName => "noSuchName",
            Self::BadValue => "badValue",
            Self::ReadOnly => "readOnly",
            Self::GenErr => "genErr",
            Self::NoAccess => "noAccess",
            Self::WrongType => "wrongType",
            Self::WrongLength => "wrongLength",
            Self::WrongEncoding => "wrongEncoding",
            Self::WrongValue => "wrongValue",
            Self::NoCreation => "noCreation",
            Self::InconsistentValue => "inconsistentValue",
            Self::ResourceUnavailable => "resourceUnavailable",
            Self::CommitFailed => "commitFailed",
            Self::UndoFailed => "undoFailed",
            Self::AuthorizationError => "authorizationError",
            Self::NotWritable => "notWritable",
            Self::InconsistentName => "inconsistentName",
            Self::Unknown(code) => return write!(f, "unknown({})", code),
        };
        f.write_str(name)
    }
}

/// Library error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error while binding or receiving.
    #[error("I/O error{}: {source}", target.map(|t| format!(" communicating with {}", t)).unwrap_or_default())]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// Transmitting a request datagram failed. No retry is attempted.
    #[error("failed to send request {request_id} to {target}: {source}")]
    SendFailure {
        target: SocketAddr,
        request_id: i32,
        #[source]
        source: std::io::Error,
    },

    /// Request timed out after all retries.
    #[error("timeout after {elapsed:?} waiting for {target} (request_id={request_id}, retries={retries})")]
    Timeout {
        target: SocketAddr,
        elapsed: Duration,
        request_id: i32,
        retries: u32,
    },

    /// The agent answered with a non-zero error status.
    #[error("SNMP error from {target}: {status} at index {index}")]
    Snmp {
        target: SocketAddr,
        status: ErrorStatus,
        index: u32,
        oid: Option<Oid>,
    },

    /// Invalid OID format.
    #[error("invalid OID: {kind}{}", input.as_ref().map(|i| format!(" ({:?})", i)).unwrap_or_default())]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>,
    },

    /// BER decoding error.
    #[error("decode error at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// A datagram could not be parsed as a complete SNMP message.
    #[error("malformed SNMP message: {source}")]
    MalformedMessage {
        #[source]
        source: Box<Error>,
    },

    /// PDU tag outside the known PDU set.
    #[error("unknown PDU type: 0x{tag:02X}")]
    UnknownPduType { tag: u8 },

    /// Value tag outside the SNMP data type enumeration.
    #[error("invalid value type tag: 0x{tag:02X}")]
    InvalidType { tag: u8 },

    /// The value type cannot be encoded by a manager.
    #[error("unsupported value type for encoding: {value_type}")]
    UnsupportedType { value_type: ValueType },

    /// A caller-supplied value does not fit the requested type.
    #[error("invalid {value_type} value: {reason}")]
    InvalidValue {
        value_type: ValueType,
        reason: Box<str>,
    },

    /// The control fields do not have the shape required by the PDU type.
    #[error("control fields do not match PDU type {pdu_type}")]
    ControlFieldMismatch { pdu_type: PduType },

    /// A PDU that expects no Response was submitted as a request.
    #[error("{pdu_type} is not a confirmed request type")]
    NotConfirmed { pdu_type: PduType },

    /// A request ID is already live in the ledger.
    #[error("request ID {request_id} is already registered")]
    DuplicateRequestId { request_id: i32 },

    /// A request ID is not live in the ledger.
    #[error("request ID {request_id} is not registered")]
    UnknownRequestId { request_id: i32 },

    /// The operation is not available in this protocol version.
    #[error("operation requires {expected}, client uses {actual}")]
    VersionMismatch { expected: Version, actual: Version },

    /// Non-increasing OID detected during walk (agent misbehavior).
    #[error("walk detected non-increasing OID: {previous} >= {current}")]
    NonIncreasingOid { previous: Oid, current: Oid },

    /// The engine event loop has shut down.
    #[error("engine closed")]
    Closed,
}

impl Error {
    /// Create a decode error.
    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }

    /// Create an invalid OID error from a kind (no input string).
    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// Create an invalid OID error with the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(value_type: ValueType, reason: impl Into<Box<str>>) -> Self {
        Self::InvalidValue {
            value_type,
            reason: reason.into(),
        }
    }

    /// Wrap a parse failure as [`Error::MalformedMessage`].
    ///
    /// Already-wrapped errors are returned unchanged.
    pub fn malformed(source: Error) -> Self {
        match source {
            err @ Self::MalformedMessage { .. } => err,
            other => Self::MalformedMessage {
                source: Box::new(other),
            },
        }
    }

    /// Get the target address if this error has one.
    pub fn target(&self) -> Option<SocketAddr> {
        match self {
            Self::Io { target, .. } => *target,
            Self::SendFailure { target, .. }
            | Self::Timeout { target, .. }
            | Self::Snmp { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Whether this error came out of the decode chain.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. }
                | Self::MalformedMessage { .. }
                | Self::UnknownPduType { .. }
                | Self::InvalidType { .. }
        )
    }
}
