//! Request building (client side) and request parsing (agent side).

use super::community::{CommunityMessage, read_version};
use crate::ber::{Decoder, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;
use bytes::Bytes;

/// Build a GetRequest message: each OID paired with a NULL placeholder.
pub fn build_get_request(
    version: Version,
    request_id: u32,
    community: &[u8],
    oids: &[Oid],
) -> Bytes {
    CommunityMessage::new(
        version,
        Bytes::copy_from_slice(community),
        Pdu::get_request(request_id, oids),
    )
    .encode()
}

/// Build a SetRequest message.
///
/// Values are always sent as OCTET STRING.
pub fn build_set_request(
    version: Version,
    request_id: u32,
    community: &[u8],
    bindings: &[(Oid, Bytes)],
) -> Bytes {
    let varbinds = bindings
        .iter()
        .map(|(oid, data)| VarBind::new(oid.clone(), Value::OctetString(data.clone())))
        .collect();

    CommunityMessage::new(
        version,
        Bytes::copy_from_slice(community),
        Pdu::set_request(request_id, varbinds),
    )
    .encode()
}

/// One name/value pair of an inbound SetRequest, value kept raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetBinding {
    /// Target variable.
    pub oid: Oid,
    /// BER tag of the value as it arrived.
    pub tag: u8,
    /// Value content bytes.
    pub data: Bytes,
}

impl SetBinding {
    /// Whether the value arrived as an OCTET STRING, the only SET type
    /// an agent honors.
    pub fn is_octet_string(&self) -> bool {
        self.tag == tag::universal::OCTET_STRING
    }
}

/// A decoded inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// GetRequest: the OIDs to look up, in request order.
    Get {
        version: Version,
        request_id: u32,
        community: Bytes,
        oids: Vec<Oid>,
    },
    /// SetRequest: the bindings to apply, in request order.
    Set {
        version: Version,
        request_id: u32,
        community: Bytes,
        bindings: Vec<SetBinding>,
    },
}

impl Request {
    pub fn version(&self) -> Version {
        match self {
            Request::Get { version, .. } | Request::Set { version, .. } => *version,
        }
    }

    pub fn request_id(&self) -> u32 {
        match self {
            Request::Get { request_id, .. } | Request::Set { request_id, .. } => *request_id,
        }
    }

    pub fn community(&self) -> &Bytes {
        match self {
            Request::Get { community, .. } | Request::Set { community, .. } => community,
        }
    }

    /// The OIDs named by this request, in request order.
    pub fn oids(&self) -> Vec<Oid> {
        match self {
            Request::Get { oids, .. } => oids.clone(),
            Request::Set { bindings, .. } => bindings.iter().map(|b| b.oid.clone()).collect(),
        }
    }
}

/// Parse an inbound GetRequest or SetRequest.
///
/// Returns `None` for any structurally invalid message, an unsupported
/// version, or a PDU type other than GetRequest/SetRequest.
pub fn parse_request(data: Bytes) -> Option<Request> {
    let len = data.len();
    decode_request(data)
        .map_err(|e| {
            tracing::debug!(target: "snmp_wire::ber", { snmp.bytes = len, error = %e }, "dropping unparseable request");
        })
        .ok()
}

fn decode_request(data: Bytes) -> Result<Request> {
    let mut decoder = Decoder::new(data);
    let mut msg = decoder.read_sequence()?;

    let version = read_version(&mut msg)?;
    let community = msg.read_octet_string()?;

    let pdu_offset = msg.offset();
    let pdu_tag = msg.read_tag()?;
    if pdu_tag != tag::pdu::GET_REQUEST && pdu_tag != tag::pdu::SET_REQUEST {
        return Err(Error::decode(
            pdu_offset,
            DecodeErrorKind::UnknownPduType(pdu_tag),
        ));
    }
    let pdu_len = msg.read_length()?;
    let mut pdu = msg.sub_decoder(pdu_len)?;

    let request_id = pdu.read_unsigned32(tag::universal::INTEGER)?;
    let _error_status = pdu.read_integer()?;
    let _error_index = pdu.read_integer()?;

    let mut list = pdu.read_sequence()?;

    if pdu_tag == tag::pdu::GET_REQUEST {
        let mut oids = Vec::new();
        while !list.is_empty() {
            let mut vb = list.read_sequence()?;
            oids.push(vb.read_oid()?);
            // Placeholder value, normally NULL
            vb.read_tlv()?;
        }
        Ok(Request::Get {
            version,
            request_id,
            community,
            oids,
        })
    } else {
        let mut bindings = Vec::new();
        while !list.is_empty() {
            let mut vb = list.read_sequence()?;
            let oid = vb.read_oid()?;
            let (tag, data) = vb.read_tlv()?;
            bindings.push(SetBinding { oid, tag, data });
        }
        Ok(Request::Set {
            version,
            request_id,
            community,
            bindings,
        })
    }
}
