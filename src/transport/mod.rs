//! Transport layer abstraction.
//!
//! Provides the `Transport` trait and its UDP implementations: an owned,
//! connected socket per target ([`UdpTransport`]) and one socket shared by
//! many targets ([`SharedUdpTransport`]).

mod shared;
mod udp;

#[cfg(test)]
mod mock;

pub use shared::*;
pub use udp::*;

#[cfg(test)]
pub use mock::*;

use crate::error::Result;
use bytes::Bytes;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

/// Client-side transport abstraction.
///
/// For shared transports, handles (not the pool itself) implement Transport.
/// Every implementation is a cheap `Arc` clone.
pub trait Transport: Send + Sync + Clone {
    /// Prepare to receive the response to `request_id` before it is sent.
    ///
    /// Shared transports open the pending-table slot here so a reply that
    /// beats the caller to [`recv`](Transport::recv) is kept. Owned
    /// transports need nothing.
    fn register_request(&self, _request_id: u32, _timeout: Duration) {}

    /// Drop the slot opened by [`register_request`](Transport::register_request)
    /// when the request will never be answered, e.g. because sending failed.
    fn cancel_request(&self, _request_id: u32) {}

    /// Send request data to the target.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Receive the response to `request_id`, waiting at most `timeout`.
    ///
    /// Datagrams carrying any other request-id are never returned.
    ///
    /// Returns (response_data, actual_source_address)
    fn recv(
        &self,
        request_id: u32,
        timeout: Duration,
    ) -> impl Future<Output = Result<(Bytes, SocketAddr)>> + Send;

    /// The peer address for this transport.
    fn peer_addr(&self) -> SocketAddr;

    /// Local bind address.
    fn local_addr(&self) -> SocketAddr;

    /// Allocate a request ID from the transport's shared counter.
    ///
    /// For shared transports this prevents collisions between clients on one
    /// socket. Owned transports return `None` and the client uses its own
    /// generator.
    fn alloc_request_id(&self) -> Option<u32> {
        None
    }
}
