//! Response building (agent side) and response parsing (client side).

use super::community::CommunityMessage;
use crate::ber::{Decoder, tag};
use crate::error::{DecodeErrorKind, Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;
use bytes::Bytes;
use std::collections::HashMap;

/// Build a GetResponse message.
///
/// Every entry in `results` yields exactly one varbind, in order; an entry
/// with no value is sent as NULL.
pub fn build_get_response(
    version: Version,
    request_id: u32,
    community: &[u8],
    results: &[(Oid, Option<Value>)],
) -> Bytes {
    let varbinds = results
        .iter()
        .map(|(oid, value)| VarBind::new(oid.clone(), value.clone().unwrap_or(Value::Null)))
        .collect();

    CommunityMessage::new(
        version,
        Bytes::copy_from_slice(community),
        Pdu::response(request_id, varbinds),
    )
    .encode()
}

/// A decoded GetResponse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub version: Version,
    pub request_id: u32,
    pub community: Bytes,
    pub error_status: i32,
    pub error_index: i32,
    /// Varbinds in the order the agent sent them.
    pub varbinds: Vec<VarBind>,
}

impl Response {
    /// Check if the agent reported an error.
    pub fn is_error(&self) -> bool {
        self.error_status != 0
    }

    /// Get the error status as an enum.
    pub fn error_status_enum(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }

    /// Collapse the varbinds into an OID-keyed map.
    ///
    /// A repeated OID keeps its last value.
    pub fn into_map(self) -> HashMap<Oid, Value> {
        self.varbinds
            .into_iter()
            .map(|vb| (vb.oid, vb.value))
            .collect()
    }
}

/// Parse a GetResponse.
///
/// With `expected_request_id` set, a response carrying any other request-id
/// yields `None`, as does anything that is not a well-formed v1/v2c
/// GetResponse.
pub fn parse_response(data: Bytes, expected_request_id: Option<u32>) -> Option<Response> {
    let len = data.len();
    let response = decode_response(data)
        .map_err(|e| {
            tracing::debug!(target: "snmp_wire::ber", { snmp.bytes = len, error = %e }, "dropping unparseable response");
        })
        .ok()?;

    match expected_request_id {
        Some(expected) if expected != response.request_id => {
            tracing::debug!(target: "snmp_wire::ber", { snmp.request_id = response.request_id, expected }, "dropping response for another request");
            None
        }
        _ => Some(response),
    }
}

/// Decode a GetResponse, keeping the error.
pub(crate) fn decode_response(data: Bytes) -> Result<Response> {
    let msg = CommunityMessage::decode(data)?;

    if msg.pdu.pdu_type != PduType::Response {
        return Err(Error::decode(
            0,
            DecodeErrorKind::UnexpectedTag {
                expected: tag::pdu::RESPONSE,
                actual: msg.pdu.pdu_type.tag(),
            },
        ));
    }

    Ok(Response {
        version: msg.version,
        request_id: msg.pdu.request_id,
        community: msg.community,
        error_status: msg.pdu.error_status,
        error_index: msg.pdu.error_index,
        varbinds: msg.pdu.varbinds,
    })
}

/// Peek at the request-id of any v1/v2c message without decoding varbinds.
pub fn extract_request_id(data: &[u8]) -> Option<u32> {
    let mut decoder = Decoder::from_slice(data);
    let mut msg = decoder.read_sequence().ok()?;
    msg.read_integer().ok()?;
    msg.read_octet_string().ok()?;
    msg.read_tag().ok()?;
    msg.read_length().ok()?;
    msg.read_unsigned32(tag::universal::INTEGER).ok()
}
