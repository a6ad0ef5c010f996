//! SNMP message framing for v1/v2c.
//!
//! [`CommunityMessage`] is the structured layer. The free functions on top
//! of it are what the client and agent drivers use: builders that return
//! ready-to-send datagrams and parsers that return `None` for anything they
//! cannot use.
//!
//! ```
//! use snmp_wire::message::{build_get_request, parse_request, Request};
//! use snmp_wire::{Version, oid};
//!
//! let bytes = build_get_request(Version::V2c, 1, b"public", &[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)]);
//! let Some(Request::Get { oids, .. }) = parse_request(bytes) else { unreachable!() };
//! assert_eq!(oids[0].to_string(), "1.3.6.1.2.1.1.1.0");
//! ```

mod community;
mod request;
mod response;

pub use community::CommunityMessage;
pub use request::{Request, SetBinding, build_get_request, build_set_request, parse_request};
pub use response::{Response, build_get_response, extract_request_id, parse_response};

pub(crate) use response::decode_response;
