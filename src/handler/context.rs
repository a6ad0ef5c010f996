//! Request context for variable stores.

use std::net::SocketAddr;

use bytes::Bytes;

use crate::pdu::PduType;
use crate::version::Version;

/// Request context passed to [`VariableStore`](super::VariableStore) calls.
///
/// Carries enough about the incoming request for a store to make its own
/// authorization decisions beyond the agent's community check.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Source address of the request.
    pub source: SocketAddr,
    /// SNMP version.
    pub version: Version,
    /// Community string the request carried.
    pub community: Bytes,
    /// Request ID from the PDU.
    pub request_id: u32,
    /// PDU type (GetRequest or SetRequest).
    pub pdu_type: PduType,
}
