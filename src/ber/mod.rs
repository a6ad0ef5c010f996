//! BER (Basic Encoding Rules) codec for SNMP.
//!
//! This module provides encoding and decoding of the BER subset SNMP v1/v2c
//! uses: INTEGER, OCTET STRING, NULL, OBJECT IDENTIFIER, SEQUENCE and the
//! context-specific PDU wrappers. Parsing is permissive in the same places
//! net-snmp is (non-minimal integers and lengths), strict everywhere else.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
