//! UDP transport implementation.

use super::Transport;
use crate::error::{Error, Result};
use crate::message::extract_request_id;
use crate::util::bind_ephemeral_udp_socket;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;

/// Largest datagram a UDP socket can deliver.
const MAX_DATAGRAM: usize = 65535;

/// UDP transport for a single target.
///
/// Each `UdpTransport` owns a connected UDP socket to a specific target and
/// carries one request at a time. For many targets, or concurrent requests
/// to one target, use [`SharedUdpTransport`](super::SharedUdpTransport).
#[derive(Clone)]
pub struct UdpTransport {
    inner: Arc<UdpTransportInner>,
}

struct UdpTransportInner {
    socket: UdpSocket,
    target: SocketAddr,
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Connect to a target address.
    ///
    /// Binds an ephemeral socket in the target's address family. Nothing is
    /// sent; UDP "connect" only fixes the peer.
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        tracing::debug!(target: "snmp_wire::transport", { snmp.target = %target }, "connecting UDP transport");

        let io_err = |e| Error::Io {
            target: Some(target),
            source: e,
        };

        let socket = bind_ephemeral_udp_socket(target).await.map_err(io_err)?;
        socket.connect(target).await.map_err(io_err)?;
        let local_addr = socket.local_addr().map_err(io_err)?;

        tracing::debug!(
            target: "snmp_wire::transport",
            { snmp.target = %target, snmp.local_addr = %local_addr },
            "UDP transport connected"
        );

        Ok(Self {
            inner: Arc::new(UdpTransportInner {
                socket,
                target,
                local_addr,
            }),
        })
    }
}

impl Transport for UdpTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        tracing::trace!(
            target: "snmp_wire::transport",
            { snmp.target = %self.inner.target, snmp.bytes = data.len() },
            "UDP send"
        );
        self.inner.socket.send(data).await.map_err(|e| Error::Io {
            target: Some(self.inner.target),
            source: e,
        })?;
        Ok(())
    }

    async fn recv(&self, request_id: u32, recv_timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let deadline = Instant::now() + recv_timeout;
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            let result = tokio::time::timeout_at(deadline, self.inner.socket.recv(&mut buf)).await;

            let len = match result {
                Ok(Ok(len)) => len,
                Ok(Err(e)) => {
                    tracing::debug!(
                        target: "snmp_wire::transport",
                        { snmp.target = %self.inner.target, error = %e },
                        "UDP recv error"
                    );
                    return Err(Error::Io {
                        target: Some(self.inner.target),
                        source: e,
                    });
                }
                Err(_) => {
                    tracing::trace!(
                        target: "snmp_wire::transport",
                        { snmp.target = %self.inner.target, snmp.request_id = request_id },
                        "UDP recv timeout"
                    );
                    return Err(Error::Timeout {
                        target: Some(self.inner.target),
                        elapsed: recv_timeout,
                        request_id,
                    });
                }
            };

            let data = &buf[..len];
            match extract_request_id(data) {
                Some(id) if id == request_id => {
                    tracing::trace!(
                        target: "snmp_wire::transport",
                        { snmp.target = %self.inner.target, snmp.bytes = len },
                        "UDP recv complete"
                    );
                    return Ok((Bytes::copy_from_slice(data), self.inner.target));
                }
                other => {
                    // Late reply to an earlier request, or garbage
                    tracing::debug!(
                        target: "snmp_wire::transport",
                        { snmp.target = %self.inner.target, snmp.request_id = request_id, received = ?other },
                        "discarding datagram for another request"
                    );
                }
            }
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.inner.target
    }

    fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr
    }
}
