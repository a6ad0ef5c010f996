// The Error enum carries an OID inline on SNMP errors
#![allow(clippy::result_large_err)]

//! # snmp-wire
//!
//! Minimal async SNMP v1/v2c engine: one BER codec and PDU model shared by a
//! request/response client and a store-backed agent.
//!
//! ## Features
//!
//! - SNMPv1 and SNMPv2c GetRequest, SetRequest and Response
//! - Fail-soft message parsers returning `Option`
//! - Request-id correlation over an owned or shared UDP socket
//! - Agent answering from any [`VariableStore`](handler::VariableStore)
//! - Traffic observation through a trait or a channel
//!
//! ## Client
//!
//! ```rust,no_run
//! use snmp_wire::Client;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), snmp_wire::Error> {
//!     let client = Client::v2c("192.168.1.1")
//!         .community(b"public")
//!         .timeout(Duration::from_secs(2))
//!         .connect()
//!         .await?;
//!
//!     let values = client.get("1.3.6.1.2.1.1.1.0").await;
//!     for (oid, value) in &values {
//!         println!("{} = {}", oid, value);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! `get`/`set` never fail: a timeout or undecodable reply yields an empty
//! map. Use [`Client::try_get`] and [`Client::try_set`] to see the error.
//!
//! ## Agent
//!
//! ```rust,no_run
//! use snmp_wire::agent::Agent;
//! use snmp_wire::handler::MemoryStore;
//! use snmp_wire::oid;
//! use std::sync::Arc;
//!
//! # async fn example() -> snmp_wire::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! store.insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), "widget");
//!
//! let agent = Agent::builder()
//!     .bind("0.0.0.0:1161")
//!     .store(store)
//!     .build()
//!     .await?;
//! let handle = agent.start();
//! // ...
//! agent.stop();
//! handle.await.ok();
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Events are emitted with [`tracing`] under the `snmp_wire::ber`,
//! `snmp_wire::client`, `snmp_wire::agent` and `snmp_wire::transport`
//! targets. The library never installs a subscriber.

#[cfg(feature = "agent")]
pub mod agent;
pub mod ber;
pub mod client;
pub mod error;
pub mod handler;
pub mod message;
pub mod observer;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod util;

// Re-exports for convenience
#[cfg(feature = "agent")]
pub use agent::{Agent, AgentBuilder};
pub use client::{Client, ClientConfig, RequestIdGenerator, V1ClientBuilder, V2cClientBuilder};
pub use error::{DecodeErrorKind, Error, ErrorStatus, OidErrorKind, Result};
pub use handler::{FnStore, MemoryStore, RequestContext, VariableStore};
pub use message::{Request, Response, parse_request, parse_response};
pub use observer::{Direction, TrafficEvent, TrafficObserver};
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use transport::{SharedUdpHandle, SharedUdpTransport, Transport, UdpTransport};
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;

/// Client over a dedicated UDP socket.
pub type UdpClient = Client<UdpTransport>;

/// Client over a [`SharedUdpTransport`] handle; supports concurrent calls.
pub type SharedClient = Client<SharedUdpHandle>;
