//! Shared UDP transport for polling many targets from one socket.
//!
//! When a poller talks to many agents at once, a dedicated socket per target
//! becomes wasteful. The shared transport uses a single UDP socket and routes
//! each response to its waiting client by request-id.
//!
//! # Architecture
//!
//! ```text
//! +--------------------+
//! | SharedUdpTransport |  (owns UDP socket, spawns recv loop)
//! +--------------------+
//!          |
//!          | Arc<Inner>
//!          v
//! +-------------------+     +-------------------+
//! | SharedUdpHandle   |     | SharedUdpHandle   |
//! | target: 10.0.0.1  |     | target: 10.0.0.2  |
//! +-------------------+     +-------------------+
//!          |                         |
//!          v                         v
//! +-------------------+     +-------------------+
//! |    Client<SH>     |     |    Client<SH>     |
//! +-------------------+     +-------------------+
//! ```
//!
//! - [`SharedUdpTransport`] binds a single UDP socket and spawns a background
//!   task that receives all incoming packets.
//! - Each [`SharedUdpHandle`] represents a logical connection to one target.
//! - Handles implement [`Transport`], so they work with [`Client`](crate::Client).
//! - The pending table maps request-id to a response slot. A slot is opened
//!   before the request is sent, filled by the receive task and emptied by
//!   the waiting caller, even if the caller gives up early. The receive task
//!   sweeps out slots past their deadline on a timer, so an idle socket
//!   doesn't accumulate abandoned requests.
//!
//! Request-ids come from one counter per socket, so clients sharing the
//! socket never collide. The receive task stops once the transport and every
//! handle have been dropped.
//!
//! ```rust,no_run
//! use snmp_wire::Client;
//! use snmp_wire::transport::SharedUdpTransport;
//!
//! # async fn example() -> snmp_wire::Result<()> {
//! let shared = SharedUdpTransport::bind("0.0.0.0:0").await?;
//!
//! let a = Client::v2c("192.0.2.1:161").build(shared.handle("192.0.2.1:161".parse().unwrap()));
//! let b = Client::v2c("192.0.2.2:161").build(shared.handle("192.0.2.2:161".parse().unwrap()));
//!
//! let (ra, rb) = tokio::join!(a.get("1.3.6.1.2.1.1.1.0"), b.get("1.3.6.1.2.1.1.1.0"));
//! println!("{:?} {:?}", ra, rb);
//! # Ok(())
//! # }
//! ```

use super::Transport;
use crate::client::RequestIdGenerator;
use crate::error::{Error, Result};
use crate::message::extract_request_id;
use crate::util::bind_udp_socket;
use bytes::Bytes;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::Notify;
use tokio_util::sync::{CancellationToken, DropGuard};

/// How often the receive task drops pending entries past their deadline.
const SWEEP_INTERVAL: Duration = Duration::from_millis(50);

/// Shared UDP transport.
///
/// A single unconnected UDP socket shared across many clients. Each client
/// gets a [`SharedUdpHandle`] that implements [`Transport`].
#[derive(Clone)]
pub struct SharedUdpTransport {
    state: Arc<SharedState>,
}

impl std::fmt::Debug for SharedUdpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedUdpTransport")
            .field("local_addr", &self.state.inner.local_addr)
            .finish_non_exhaustive()
    }
}

/// Held by the transport and every handle; dropping the last one stops the
/// receive task.
struct SharedState {
    inner: Arc<SharedUdpTransportInner>,
    _shutdown: DropGuard,
}

struct SharedUdpTransportInner {
    socket: UdpSocket,
    local_addr: SocketAddr,
    pending: Mutex<HashMap<u32, PendingRequest>>,
    /// Woken whenever any slot is filled.
    delivered: Notify,
    config: SharedTransportConfig,
    request_ids: RequestIdGenerator,
}

impl SharedUdpTransportInner {
    fn pending(&self) -> MutexGuard<'_, HashMap<u32, PendingRequest>> {
        // The table holds no invariant a panicking holder could break
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct PendingRequest {
    target: SocketAddr,
    deadline: Instant,
    response: Option<(Bytes, SocketAddr)>,
}

/// Configuration for shared UDP transport.
#[derive(Debug, Clone)]
pub struct SharedTransportConfig {
    /// Log warning when response source differs from target (default: true)
    pub warn_on_source_mismatch: bool,
    /// Maximum message size (default: 65535)
    pub max_message_size: usize,
}

impl Default for SharedTransportConfig {
    fn default() -> Self {
        Self {
            warn_on_source_mismatch: true,
            max_message_size: 65535,
        }
    }
}

impl SharedUdpTransport {
    /// Bind a shared UDP transport to the given address with default settings.
    pub async fn bind(addr: impl Into<String>) -> Result<Self> {
        Self::builder().bind(addr).build().await
    }

    /// Create a builder for configuring the shared transport.
    pub fn builder() -> SharedUdpTransportBuilder {
        SharedUdpTransportBuilder::new()
    }

    /// Create a handle for a specific target.
    ///
    /// Handles are cheap to create and clone. Several handles may point at
    /// the same target, e.g. for different communities.
    pub fn handle(&self, target: SocketAddr) -> SharedUdpHandle {
        SharedUdpHandle {
            state: self.state.clone(),
            target,
        }
    }

    /// Get the local bind address.
    ///
    /// Useful when binding to port 0 to discover the assigned port.
    pub fn local_addr(&self) -> SocketAddr {
        self.state.inner.local_addr
    }

    /// Number of requests currently awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.state.inner.pending().len()
    }

    fn start_recv_loop(inner: Arc<SharedUdpTransportInner>, shutdown: CancellationToken) {
        tokio::spawn(async move {
            let mut buf = vec![0u8; inner.config.max_message_size];
            let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
            sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                let received = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = sweep.tick() => {
                        Self::sweep_expired(&inner);
                        continue;
                    }
                    received = inner.socket.recv_from(&mut buf) => received,
                };

                match received {
                    Ok((len, source)) => {
                        tracing::trace!(
                            target: "snmp_wire::transport",
                            { snmp.source = %source, snmp.bytes = len },
                            "shared transport received packet"
                        );
                        Self::dispatch(&inner, Bytes::copy_from_slice(&buf[..len]), source);
                    }
                    Err(e) => {
                        // Socket errors on shared transport are logged but don't stop the loop
                        tracing::warn!(target: "snmp_wire::transport", { error = %e }, "shared transport recv error");
                    }
                }
            }

            tracing::debug!(
                target: "snmp_wire::transport",
                { snmp.local_addr = %inner.local_addr },
                "shared transport recv loop stopped"
            );
        });
    }

    fn sweep_expired(inner: &SharedUdpTransportInner) {
        let now = Instant::now();
        let mut table = inner.pending();
        let before = table.len();
        table.retain(|_, p| p.deadline > now);
        let expired = before - table.len();
        if expired > 0 {
            tracing::trace!(
                target: "snmp_wire::transport",
                { expired },
                "swept expired pending requests"
            );
        }
    }

    fn dispatch(inner: &SharedUdpTransportInner, data: Bytes, source: SocketAddr) {
        let Some(request_id) = extract_request_id(&data) else {
            tracing::debug!(
                target: "snmp_wire::transport",
                { snmp.source = %source, snmp.bytes = data.len() },
                "received malformed response (couldn't extract request_id)"
            );
            return;
        };

        let target = {
            let mut table = inner.pending();
            match table.get_mut(&request_id) {
                Some(slot) if slot.response.is_none() => {
                    slot.response = Some((data, source));
                    Some(slot.target)
                }
                // Duplicate reply; the first one wins
                Some(_) => return,
                None => None,
            }
        };

        let Some(target) = target else {
            tracing::debug!(
                target: "snmp_wire::transport",
                { snmp.request_id = request_id, snmp.source = %source },
                "received response for unknown request_id"
            );
            return;
        };

        if inner.config.warn_on_source_mismatch && source != target {
            tracing::warn!(
                target: "snmp_wire::transport",
                { snmp.request_id = request_id, snmp.target = %target, snmp.source = %source },
                "response source address mismatch"
            );
        }

        inner.delivered.notify_waiters();
    }
}

/// Builder for [`SharedUdpTransport`].
pub struct SharedUdpTransportBuilder {
    bind_addr: String,
    config: SharedTransportConfig,
}

impl SharedUdpTransportBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "0.0.0.0:0".into(),
            config: SharedTransportConfig::default(),
        }
    }

    /// Set the local bind address.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Configure warning on source address mismatch (default: true).
    ///
    /// Responses from a different address than the target are common behind
    /// NAT or with multi-homed devices.
    pub fn warn_on_source_mismatch(mut self, warn: bool) -> Self {
        self.config.warn_on_source_mismatch = warn;
        self
    }

    /// Set maximum receive buffer size (default: 65535).
    ///
    /// Larger datagrams are truncated and will fail to parse.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// Build the shared transport and start its receive task.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn build(self) -> Result<SharedUdpTransport> {
        let bind_addr: SocketAddr = self
            .bind_addr
            .parse()
            .map_err(|_| Error::Config(format!("invalid bind address: {}", self.bind_addr)))?;

        let socket = bind_udp_socket(bind_addr, None)
            .await
            .map_err(|e| Error::Io {
                target: Some(bind_addr),
                source: e,
            })?;

        let local_addr = socket.local_addr().map_err(|e| Error::Io {
            target: Some(bind_addr),
            source: e,
        })?;

        tracing::debug!(
            target: "snmp_wire::transport",
            { snmp.local_addr = %local_addr },
            "shared UDP transport bound"
        );

        let inner = Arc::new(SharedUdpTransportInner {
            socket,
            local_addr,
            pending: Mutex::new(HashMap::new()),
            delivered: Notify::new(),
            config: self.config,
            // Random seed so a quick restart (SO_REUSEADDR) doesn't reuse
            // the previous incarnation's ids
            request_ids: RequestIdGenerator::new(),
        });

        let shutdown = CancellationToken::new();
        SharedUdpTransport::start_recv_loop(inner.clone(), shutdown.clone());

        Ok(SharedUdpTransport {
            state: Arc::new(SharedState {
                inner,
                _shutdown: shutdown.drop_guard(),
            }),
        })
    }
}

impl Default for SharedUdpTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes a pending-table entry when its waiter finishes or is dropped.
struct PendingGuard<'a> {
    inner: &'a SharedUdpTransportInner,
    request_id: u32,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.inner.pending().remove(&self.request_id);
    }
}

/// Handle to a shared UDP transport for a specific target.
///
/// Created via [`SharedUdpTransport::handle()`]. Implements [`Transport`]
/// and can be used with [`Client`](crate::Client). Unlike
/// [`UdpTransport`](super::UdpTransport), concurrent requests through one
/// handle are fine: each waits on its own pending-table entry.
#[derive(Clone)]
pub struct SharedUdpHandle {
    state: Arc<SharedState>,
    target: SocketAddr,
}

impl Transport for SharedUdpHandle {
    async fn send(&self, data: &[u8]) -> Result<()> {
        tracing::trace!(
            target: "snmp_wire::transport",
            { snmp.target = %self.target, snmp.bytes = data.len() },
            "shared UDP send"
        );
        self.state
            .inner
            .socket
            .send_to(data, self.target)
            .await
            .map_err(|e| Error::Io {
                target: Some(self.target),
                source: e,
            })?;
        Ok(())
    }

    fn register_request(&self, request_id: u32, timeout: Duration) {
        self.state.inner.pending().insert(
            request_id,
            PendingRequest {
                target: self.target,
                deadline: Instant::now() + timeout,
                response: None,
            },
        );
    }

    fn cancel_request(&self, request_id: u32) {
        self.state.inner.pending().remove(&request_id);
    }

    async fn recv(&self, request_id: u32, timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let inner = &self.state.inner;

        let deadline = {
            let mut table = inner.pending();
            table
                .entry(request_id)
                .or_insert_with(|| PendingRequest {
                    target: self.target,
                    deadline: Instant::now() + timeout,
                    response: None,
                })
                .deadline
        };
        let _guard = PendingGuard {
            inner: inner.as_ref(),
            request_id,
        };

        loop {
            // Enable the wakeup before looking, so a delivery in between
            // isn't missed
            let delivered = inner.delivered.notified();
            tokio::pin!(delivered);
            delivered.as_mut().enable();

            {
                let mut table = inner.pending();
                match table.get_mut(&request_id) {
                    Some(slot) => {
                        if let Some((data, source)) = slot.response.take() {
                            tracing::trace!(
                                target: "snmp_wire::transport",
                                { snmp.target = %self.target, snmp.source = %source, snmp.bytes = data.len() },
                                "shared UDP recv complete"
                            );
                            return Ok((data, source));
                        }
                        if Instant::now() >= deadline {
                            break;
                        }
                    }
                    // Swept by the receive task after its deadline
                    None => break,
                }
            }

            tokio::select! {
                _ = &mut delivered => {}
                _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {}
            }
        }

        tracing::trace!(
            target: "snmp_wire::transport",
            { snmp.target = %self.target, snmp.request_id = request_id },
            "shared UDP recv timeout"
        );
        Err(Error::Timeout {
            target: Some(self.target),
            elapsed: timeout,
            request_id,
        })
    }

    fn peer_addr(&self) -> SocketAddr {
        self.target
    }

    fn local_addr(&self) -> SocketAddr {
        self.state.inner.local_addr
    }

    fn alloc_request_id(&self) -> Option<u32> {
        Some(self.state.inner.request_ids.next())
    }
}
