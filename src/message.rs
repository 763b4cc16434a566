//! Community-based SNMP message format (v1/v2c).
//!
//! V1 and V2c messages share the same structure:
//! `SEQUENCE { version INTEGER, community OCTET STRING, pdu PDU }`
//!
//! The only difference is the version number (0 for v1, 1 for v2c).

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::pdu::Pdu;
use crate::version::Version;

/// Envelope parameters for outgoing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub version: Version,
    pub community: Bytes,
}

impl ClientOptions {
    pub fn new(version: Version, community: impl Into<Bytes>) -> Self {
        Self {
            version,
            community: community.into(),
        }
    }
}

impl Default for ClientOptions {
    /// SNMPv2c with community `public`.
    fn default() -> Self {
        Self::new(Version::V2c, Bytes::from_static(b"public"))
    }
}

/// Community-based SNMP message (v1/v2c).
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityMessage {
    /// SNMP version (V1 or V2c)
    pub version: Version,
    /// Community string for authentication
    pub community: Bytes,
    /// Protocol data unit
    pub pdu: Pdu,
}

impl CommunityMessage {
    /// Build a message from its fields.
    pub fn from_fields(version: Version, community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            version,
            community: community.into(),
            pdu,
        }
    }

    /// Wrap `pdu` using the version and community of `options`.
    pub fn with_options(options: &ClientOptions, pdu: Pdu) -> Self {
        Self::from_fields(options.version, options.community.clone(), pdu)
    }

    /// Encode to BER.
    ///
    /// Fails only if a varbind value cannot be encoded.
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = EncodeBuf::new();

        buf.try_push_sequence(|buf| {
            self.pdu.encode(buf)?;
            buf.push_octet_string(&self.community);
            buf.push_integer(self.version.as_i32());
            Ok::<_, Error>(())
        })?;

        Ok(buf.finish())
    }

    /// Decode a complete datagram.
    ///
    /// Every failure, including bytes after the outer sequence, is reported
    /// as [`Error::MalformedMessage`] carrying the underlying cause. Nothing is
    /// partially accepted.
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        Self::decode(data).map_err(Error::malformed)
    }

    fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;
        decoder.expect_end()?;

        let version_num = seq.read_integer()?;
        let version = Version::from_i32(version_num).ok_or_else(|| {
            tracing::debug!(target: "snmp_engine::message", { snmp.offset = seq.offset(), version = version_num }, "unsupported SNMP version");
            Error::decode(seq.offset(), DecodeErrorKind::UnknownVersion(version_num))
        })?;

        let community = seq.read_octet_string()?;
        let pdu = Pdu::decode(&mut seq)?;
        seq.expect_end()?;

        Ok(CommunityMessage {
            version,
            community,
            pdu,
        })
    }

    /// Consume and return the PDU.
    pub fn into_pdu(self) -> Pdu {
        self.pdu
    }
}

/// Extract the request ID from a raw datagram without a full decode.
///
/// Returns `None` for TrapV1 PDUs and anything that does not parse as far as
/// the request ID.
pub fn peek_request_id(data: &[u8]) -> Option<i32> {
    let mut decoder = Decoder::from_slice(data);
    let mut seq = decoder.read_sequence().ok()?;
    seq.read_integer().ok()?;
    seq.read_octet_string().ok()?;
    let pdu_tag = seq.read_tag().ok()?;
    if pdu_tag == tag::pdu::TRAP_V1 || !tag::is_constructed(pdu_tag) {
        return None;
    }
    seq.read_length().ok()?;
    seq.read_integer().ok()
}
