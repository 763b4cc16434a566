//! SNMP Protocol Data Units (PDUs).
//!
//! A PDU is a type tag, a fixed-shape set of control fields and an ordered
//! list of variable bindings. Every PDU type except TrapV1 carries
//! `{request_id, error_status, error_index}`; TrapV1 carries its own five
//! fields.

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// PDU type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PduType {
    GetRequest = tag::pdu::GET_REQUEST,
    GetNextRequest = tag::pdu::GET_NEXT_REQUEST,
    Response = tag::pdu::RESPONSE,
    SetRequest = tag::pdu::SET_REQUEST,
    TrapV1 = tag::pdu::TRAP_V1,
    GetBulkRequest = tag::pdu::GET_BULK_REQUEST,
    InformRequest = tag::pdu::INFORM_REQUEST,
    TrapV2 = tag::pdu::TRAP_V2,
    Report = tag::pdu::REPORT,
}

impl PduType {
    /// Create from tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            tag::pdu::GET_REQUEST => Self::GetRequest,
            tag::pdu::GET_NEXT_REQUEST => Self::GetNextRequest,
            tag::pdu::RESPONSE => Self::Response,
            tag::pdu::SET_REQUEST => Self::SetRequest,
            tag::pdu::TRAP_V1 => Self::TrapV1,
            tag::pdu::GET_BULK_REQUEST => Self::GetBulkRequest,
            tag::pdu::INFORM_REQUEST => Self::InformRequest,
            tag::pdu::TRAP_V2 => Self::TrapV2,
            tag::pdu::REPORT => Self::Report,
            _ => return None,
        })
    }

    /// Get the tag byte.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Whether this type expects a Response and so is tracked for retry.
    pub fn is_request_class(self) -> bool {
        matches!(
            self,
            Self::GetRequest
                | Self::GetNextRequest
                | Self::SetRequest
                | Self::InformRequest
                | Self::GetBulkRequest
        )
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GetRequest => write!(f, "GetRequest"),
            Self::GetNextRequest => write!(f, "GetNextRequest"),
            Self::Response => write!(f, "Response"),
            Self::SetRequest => write!(f, "SetRequest"),
            Self::TrapV1 => write!(f, "TrapV1"),
            Self::GetBulkRequest => write!(f, "GetBulkRequest"),
            Self::InformRequest => write!(f, "InformRequest"),
            Self::TrapV2 => write!(f, "TrapV2"),
            Self::Report => write!(f, "Report"),
        }
    }
}

/// Control fields shared by every PDU type except TrapV1.
///
/// For GetBulkRequest, `error_status` holds non-repeaters and `error_index`
/// holds max-repetitions (RFC 3416 Section 4.2.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommonFields {
    pub request_id: i32,
    pub error_status: i32,
    pub error_index: i32,
}

impl CommonFields {
    pub fn new(request_id: i32) -> Self {
        Self {
            request_id,
            ..Self::default()
        }
    }
}

/// SNMPv1 Trap control fields (RFC 1157 Section 4.1.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrapV1Fields {
    /// sysObjectID of the entity generating the trap
    pub enterprise: Oid,
    pub agent_addr: [u8; 4],
    pub generic_trap: i32,
    /// Meaningful when `generic_trap` is enterpriseSpecific
    pub specific_trap: i32,
    /// Hundredths of a second since the sender (re)initialized
    pub time_stamp: u32,
}

impl TrapV1Fields {
    /// Get the generic trap type as an enum.
    pub fn generic(&self) -> Option<GenericTrap> {
        GenericTrap::from_i32(self.generic_trap)
    }

    /// Translate to an SNMPv2 `snmpTrapOID.0` value (RFC 3584 Section 3).
    ///
    /// Generic traps 0-5 map to `snmpTraps.{generic + 1}`. Anything else is
    /// treated as enterprise-specific and maps to `enterprise.0.specific`.
    ///
    /// ```
    /// use snmp_engine::oid;
    /// use snmp_engine::pdu::{GenericTrap, TrapV1Fields};
    ///
    /// let mut fields = TrapV1Fields {
    ///     enterprise: oid!(1, 3, 6, 1, 4, 1, 9999),
    ///     agent_addr: [192, 168, 1, 1],
    ///     generic_trap: GenericTrap::LinkDown.as_i32(),
    ///     specific_trap: 0,
    ///     time_stamp: 0,
    /// };
    /// assert_eq!(fields.v2_trap_oid(), oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3));
    ///
    /// fields.generic_trap = GenericTrap::EnterpriseSpecific.as_i32();
    /// fields.specific_trap = 42;
    /// assert_eq!(fields.v2_trap_oid(), oid!(1, 3, 6, 1, 4, 1, 9999, 0, 42));
    /// ```
    pub fn v2_trap_oid(&self) -> Oid {
        match u32::try_from(self.generic_trap) {
            Ok(generic @ 0..=5) => crate::oid!(1, 3, 6, 1, 6, 3, 1, 1, 5).child(generic + 1),
            _ => self.enterprise.child(0).child(self.specific_trap as u32),
        }
    }
}

/// Fixed-shape control field record, one schema per PDU family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlFields {
    Common(CommonFields),
    TrapV1(TrapV1Fields),
}

/// SNMPv1 generic trap types (RFC 1157 Section 4.1.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum GenericTrap {
    ColdStart = 0,
    WarmStart = 1,
    LinkDown = 2,
    LinkUp = 3,
    AuthenticationFailure = 4,
    EgpNeighborLoss = 5,
    EnterpriseSpecific = 6,
}

impl GenericTrap {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::ColdStart),
            1 => Some(Self::WarmStart),
            2 => Some(Self::LinkDown),
            3 => Some(Self::LinkUp),
            4 => Some(Self::AuthenticationFailure),
            5 => Some(Self::EgpNeighborLoss),
            6 => Some(Self::EnterpriseSpecific),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// A protocol data unit.
///
/// Built either from structured fields ([`Pdu::from_fields`] and the typed
/// builders) or from wire bytes ([`Pdu::from_bytes`]). The field shape always
/// matches the type.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    pdu_type: PduType,
    fields: ControlFields,
    varbinds: Vec<VarBind>,
}

impl Pdu {
    /// Construct from parts, checking that the control fields fit the type.
    pub fn from_fields(
        pdu_type: PduType,
        fields: ControlFields,
        varbinds: Vec<VarBind>,
    ) -> Result<Self> {
        let fits = match &fields {
            ControlFields::TrapV1(_) => pdu_type == PduType::TrapV1,
            ControlFields::Common(_) => pdu_type != PduType::TrapV1,
        };
        if !fits {
            return Err(Error::ControlFieldMismatch { pdu_type });
        }
        Ok(Self {
            pdu_type,
            fields,
            varbinds,
        })
    }

    /// Decode a PDU from wire bytes.
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        Self::decode(&mut Decoder::new(data))
    }

    fn common(pdu_type: PduType, request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type,
            fields: ControlFields::Common(CommonFields::new(request_id)),
            varbinds,
        }
    }

    /// Create a GET request PDU.
    pub fn get_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::common(PduType::GetRequest, request_id, null_varbinds(oids))
    }

    /// Create a GETNEXT request PDU.
    pub fn get_next_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::common(PduType::GetNextRequest, request_id, null_varbinds(oids))
    }

    /// Create a SET request PDU.
    pub fn set_request(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self::common(PduType::SetRequest, request_id, varbinds)
    }

    /// Create a GETBULK request PDU.
    pub fn get_bulk(
        request_id: i32,
        non_repeaters: i32,
        max_repetitions: i32,
        oids: &[Oid],
    ) -> Self {
        Self {
            pdu_type: PduType::GetBulkRequest,
            fields: ControlFields::Common(CommonFields {
                request_id,
                error_status: non_repeaters,
                error_index: max_repetitions,
            }),
            varbinds: null_varbinds(oids),
        }
    }

    /// Create an SNMPv1 Trap PDU.
    pub fn trap_v1(fields: TrapV1Fields, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type: PduType::TrapV1,
            fields: ControlFields::TrapV1(fields),
            varbinds,
        }
    }

    /// Create an SNMPv2 Trap PDU. The varbinds must already start with
    /// `sysUpTime.0` and `snmpTrapOID.0`.
    pub fn trap_v2(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self::common(PduType::TrapV2, request_id, varbinds)
    }

    /// Create an InformRequest PDU, same varbind layout as [`Pdu::trap_v2`].
    pub fn inform_request(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self::common(PduType::InformRequest, request_id, varbinds)
    }

    pub fn pdu_type(&self) -> PduType {
        self.pdu_type
    }

    pub fn fields(&self) -> &ControlFields {
        &self.fields
    }

    pub fn varbinds(&self) -> &[VarBind] {
        &self.varbinds
    }

    pub fn into_varbinds(self) -> Vec<VarBind> {
        self.varbinds
    }

    /// Common control fields, or `None` for TrapV1.
    pub fn common_fields(&self) -> Option<&CommonFields> {
        match &self.fields {
            ControlFields::Common(c) => Some(c),
            ControlFields::TrapV1(_) => None,
        }
    }

    /// TrapV1 control fields, or `None` for every other type.
    pub fn trap_v1_fields(&self) -> Option<&TrapV1Fields> {
        match &self.fields {
            ControlFields::TrapV1(t) => Some(t),
            ControlFields::Common(_) => None,
        }
    }

    pub fn request_id(&self) -> Option<i32> {
        self.common_fields().map(|c| c.request_id)
    }

    pub fn error_status(&self) -> Option<ErrorStatus> {
        self.common_fields()
            .map(|c| ErrorStatus::from_i32(c.error_status))
    }

    pub fn error_index(&self) -> Option<i32> {
        self.common_fields().map(|c| c.error_index)
    }

    /// Check if this is an error response.
    pub fn is_error(&self) -> bool {
        self.common_fields().is_some_and(|c| c.error_status != 0)
    }

    /// Replace the request ID. No-op for TrapV1.
    pub(crate) fn set_request_id(&mut self, request_id: i32) {
        if let ControlFields::Common(c) = &mut self.fields {
            c.request_id = request_id;
        }
    }

    /// Encode to BER.
    ///
    /// Fails if any varbind carries a value that cannot be encoded.
    pub fn encode(&self, buf: &mut EncodeBuf) -> Result<()> {
        buf.try_push_constructed(self.pdu_type.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds)?;
            match &self.fields {
                ControlFields::Common(c) => {
                    buf.push_integer(c.error_index);
                    buf.push_integer(c.error_status);
                    buf.push_integer(c.request_id);
                }
                ControlFields::TrapV1(t) => {
                    buf.push_unsigned32(tag::application::TIMETICKS, t.time_stamp);
                    buf.push_integer(t.specific_trap);
                    buf.push_integer(t.generic_trap);
                    buf.push_ip_address(t.agent_addr);
                    buf.push_oid(&t.enterprise);
                }
            }
            Ok(())
        })
    }

    /// Decode from BER. The outer tag selects the PDU type.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let tag = decoder.read_tag()?;
        let Some(pdu_type) = PduType::from_tag(tag) else {
            tracing::debug!(target: "snmp_engine::pdu", { snmp.offset = decoder.offset() - 1, tag }, "unknown PDU type");
            return Err(Error::UnknownPduType { tag });
        };
        let len = decoder.read_length()?;
        let mut body = decoder.sub_decoder(len)?;

        let fields = match pdu_type {
            PduType::TrapV1 => ControlFields::TrapV1(decode_trap_v1_fields(&mut body)?),
            _ => ControlFields::Common(CommonFields {
                request_id: body.read_integer()?,
                error_status: body.read_integer()?,
                error_index: body.read_integer()?,
            }),
        };
        let varbinds = decode_varbind_list(&mut body)?;
        body.expect_end()?;

        Ok(Self {
            pdu_type,
            fields,
            varbinds,
        })
    }
}

fn null_varbinds(oids: &[Oid]) -> Vec<VarBind> {
    oids.iter().map(|oid| VarBind::null(oid.clone())).collect()
}

fn decode_trap_v1_fields(body: &mut Decoder) -> Result<TrapV1Fields> {
    let enterprise = body.read_oid()?;
    // NetworkAddress is APPLICATION 0 IMPLICIT OCTET STRING (SIZE (4))
    let agent_addr = body.read_ip_address()?;
    let generic_trap = body.read_integer()?;
    let specific_trap = body.read_integer()?;
    let ts_len = body.expect_tag(tag::application::TIMETICKS)?;
    let time_stamp = body.read_unsigned32_value(ts_len)?;

    Ok(TrapV1Fields {
        enterprise,
        agent_addr,
        generic_trap,
        specific_trap,
        time_stamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::value::Value;

    fn roundtrip(pdu: &Pdu) -> Pdu {
        let mut buf = EncodeBuf::new();
        pdu.encode(&mut buf).unwrap();
        Pdu::from_bytes(buf.finish()).unwrap()
    }

    #[test]
    fn test_get_request_roundtrip() {
        let oids = [
            oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
            oid!(1, 3, 6, 1, 2, 1, 1, 3, 0),
            oid!(1, 3, 6, 1, 2, 1, 1, 5, 0),
        ];
        let pdu = Pdu::get_request(12345, &oids);
        let decoded = roundtrip(&pdu);

        assert_eq!(decoded.pdu_type(), PduType::GetRequest);
        assert_eq!(decoded.request_id(), Some(12345));
        assert_eq!(decoded.error_status(), Some(ErrorStatus::NoError));
        assert_eq!(decoded.error_index(), Some(0));
        let decoded_oids: Vec<_> = decoded.varbinds().iter().map(|vb| vb.oid.clone()).collect();
        assert_eq!(decoded_oids, oids);
        assert!(decoded.varbinds().iter().all(|vb| vb.value == Value::Null));
    }

    #[test]
    fn test_decode_reads_three_distinct_fields() {
        // Response { id=7, status=2 (noSuchName), index=1, varbinds=[] }
        let bytes = [
            0xA2, 0x0B, 0x02, 0x01, 0x07, 0x02, 0x01, 0x02, 0x02, 0x01, 0x01, 0x30, 0x00,
        ];
        let pdu = Pdu::from_bytes(Bytes::copy_from_slice(&bytes)).unwrap();
        assert_eq!(pdu.request_id(), Some(7));
        assert_eq!(pdu.error_status(), Some(ErrorStatus::NoSuchName));
        assert_eq!(pdu.error_index(), Some(1));
        assert!(pdu.is_error());
    }

    #[test]
    fn test_get_bulk_fields() {
        let pdu = Pdu::get_bulk(1, 0, 25, &[oid!(1, 3, 6, 1, 2, 1, 2, 2)]);
        let c = *roundtrip(&pdu).common_fields().unwrap();
        assert_eq!(c.error_status, 0);
        assert_eq!(c.error_index, 25);
    }

    #[test]
    fn test_trap_v1_roundtrip() {
        let fields = TrapV1Fields {
            enterprise: oid!(1, 3, 6, 1, 4, 1, 9999),
            agent_addr: [10, 0, 0, 1],
            generic_trap: GenericTrap::EnterpriseSpecific.as_i32(),
            specific_trap: 17,
            time_stamp: 4_000_000_000,
        };
        let varbinds = vec![VarBind::new(oid!(1, 3, 6, 1, 4, 1, 9999, 1), Value::from("disk full"))];
        let pdu = Pdu::trap_v1(fields.clone(), varbinds.clone());
        let decoded = roundtrip(&pdu);

        assert_eq!(decoded.trap_v1_fields(), Some(&fields));
        assert_eq!(decoded.request_id(), None);
        assert_eq!(decoded.error_status(), None);
        assert_eq!(decoded.varbinds(), varbinds.as_slice());
    }

    #[test]
    fn test_from_fields_rejects_shape_mismatch() {
        let err = Pdu::from_fields(
            PduType::TrapV1,
            ControlFields::Common(CommonFields::new(1)),
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, Error::ControlFieldMismatch { pdu_type: PduType::TrapV1 }));

        let trap = TrapV1Fields {
            enterprise: oid!(1, 3),
            agent_addr: [0; 4],
            generic_trap: 0,
            specific_trap: 0,
            time_stamp: 0,
        };
        assert!(Pdu::from_fields(PduType::Response, ControlFields::TrapV1(trap), vec![]).is_err());
        assert!(
            Pdu::from_fields(PduType::Report, ControlFields::Common(CommonFields::new(9)), vec![])
                .is_ok()
        );
    }

    #[test]
    fn test_unknown_pdu_type() {
        let bytes = Bytes::from_static(&[0xA9, 0x00]);
        assert!(matches!(
            Pdu::from_bytes(bytes),
            Err(Error::UnknownPduType { tag: 0xA9 })
        ));
    }

    #[test]
    fn test_request_class() {
        let request_class: Vec<_> = (0xA0..=0xA8)
            .filter_map(PduType::from_tag)
            .filter(|t| t.is_request_class())
            .collect();
        assert_eq!(
            request_class,
            [
                PduType::GetRequest,
                PduType::GetNextRequest,
                PduType::SetRequest,
                PduType::GetBulkRequest,
                PduType::InformRequest,
            ]
        );
    }
}
