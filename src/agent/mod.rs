//! SNMP agent driver.
//!
//! Answers GetRequest and SetRequest PDUs from a [`VariableStore`]. The
//! agent owns the socket and the receive loop; the store owns the data.
//!
//! # Example
//!
//! ```rust,no_run
//! use snmp_wire::agent::Agent;
//! use snmp_wire::handler::MemoryStore;
//! use snmp_wire::oid;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> snmp_wire::Result<()> {
//!     let store = MemoryStore::new();
//!     store.insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), "My SNMP Agent");
//!
//!     let agent = Agent::builder()
//!         .bind("0.0.0.0:1161")
//!         .community(b"public")
//!         .store(Arc::new(store))
//!         .build()
//!         .await?;
//!
//!     agent.run().await
//! }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use subtle::ConstantTimeEq;
use tokio::net::UdpSocket;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::handler::{MemoryStore, RequestContext, VariableStore};
use crate::message::{Request, SetBinding, build_get_response, parse_request};
use crate::observer::{TrafficEvent, TrafficObserver, notify};
use crate::oid::Oid;
use crate::pdu::PduType;
use crate::util::bind_udp_socket;
use crate::value::Value;

/// Default maximum message size for UDP (Ethernet MTU minus IP/UDP headers).
const DEFAULT_MAX_MESSAGE_SIZE: usize = 1472;

const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 1000;

const DEFAULT_RECV_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Largest datagram a UDP socket can deliver.
const MAX_DATAGRAM: usize = 65535;

/// Pause after a failed socket read before reading again.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Builder for [`Agent`].
///
/// ```rust,no_run
/// use snmp_wire::agent::Agent;
/// use snmp_wire::handler::FnStore;
/// use std::sync::Arc;
///
/// # async fn example() -> snmp_wire::Result<()> {
/// let agent = Agent::builder()
///     .bind("127.0.0.1:1161")
///     .communities([b"public".as_slice(), b"private".as_slice()])
///     .store(Arc::new(FnStore::new(|_, oid| Some(oid.to_string()))))
///     .max_concurrent_requests(Some(64))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct AgentBuilder {
    bind_addr: String,
    communities: Vec<Vec<u8>>,
    store: Option<Arc<dyn VariableStore>>,
    observer: Option<Arc<dyn TrafficObserver>>,
    max_message_size: usize,
    max_concurrent_requests: Option<usize>,
    recv_buffer_size: Option<usize>,
    cancel: Option<CancellationToken>,
}

impl AgentBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - Bind address: `0.0.0.0:161` (UDP)
    /// - No community filter (every community accepted)
    /// - An empty [`MemoryStore`]
    /// - Max message size: 1472 bytes
    /// - Max concurrent requests: 1000
    /// - Receive buffer size: 4MB (requested from kernel)
    pub fn new() -> Self {
        Self {
            bind_addr: "0.0.0.0:161".to_string(),
            communities: Vec::new(),
            store: None,
            observer: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_concurrent_requests: Some(DEFAULT_MAX_CONCURRENT_REQUESTS),
            recv_buffer_size: Some(DEFAULT_RECV_BUFFER_SIZE),
            cancel: None,
        }
    }

    /// Set the UDP bind address.
    ///
    /// Use `[::]:161` for dual-stack.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Accept requests carrying this community string.
    ///
    /// May be called repeatedly. Once any community is configured, requests
    /// with other communities are dropped without a reply.
    pub fn community(mut self, community: &[u8]) -> Self {
        self.communities.push(community.to_vec());
        self
    }

    /// Accept requests carrying any of these community strings.
    pub fn communities<I, C>(mut self, communities: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        self.communities
            .extend(communities.into_iter().map(|c| c.as_ref().to_vec()));
        self
    }

    /// Set the store answering GET and SET.
    pub fn store(mut self, store: Arc<dyn VariableStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Report every datagram received or sent to `observer`.
    pub fn observer(mut self, observer: impl TrafficObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Largest response the agent will send. Larger responses are dropped.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Bound the number of requests handled at once (`None` for unbounded).
    pub fn max_concurrent_requests(mut self, limit: Option<usize>) -> Self {
        self.max_concurrent_requests = limit;
        self
    }

    /// Requested socket receive buffer (`None` keeps the OS default).
    pub fn recv_buffer_size(mut self, size: Option<usize>) -> Self {
        self.recv_buffer_size = size;
        self
    }

    /// Use an external cancellation token to stop the agent.
    ///
    /// If not set, the agent creates its own, reachable via
    /// [`Agent::cancel()`].
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Bind the socket and build the agent.
    pub async fn build(self) -> Result<Agent> {
        let bind_addr: SocketAddr = self
            .bind_addr
            .parse()
            .map_err(|_| Error::Config(format!("invalid bind address: {}", self.bind_addr)))?;

        let io_err = |e| Error::Io {
            target: Some(bind_addr),
            source: e,
        };

        let socket = bind_udp_socket(bind_addr, self.recv_buffer_size)
            .await
            .map_err(io_err)?;
        let local_addr = socket.local_addr().map_err(io_err)?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn VariableStore>);

        Ok(Agent {
            inner: Arc::new(AgentInner {
                socket,
                local_addr,
                communities: self.communities,
                store,
                observer: self.observer,
                max_message_size: self.max_message_size,
                concurrency_limit: self
                    .max_concurrent_requests
                    .map(|n| Arc::new(Semaphore::new(n))),
                cancel: self.cancel.unwrap_or_default(),
            }),
        })
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct AgentInner {
    socket: UdpSocket,
    local_addr: SocketAddr,
    communities: Vec<Vec<u8>>,
    store: Arc<dyn VariableStore>,
    observer: Option<Arc<dyn TrafficObserver>>,
    max_message_size: usize,
    concurrency_limit: Option<Arc<Semaphore>>,
    cancel: CancellationToken,
}

/// SNMP v1/v2c agent.
///
/// Cheap to clone; clones share the socket, store and cancellation token.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

impl Agent {
    /// Create a builder for configuring the agent.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Get the local address the agent is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr
    }

    /// Get the cancellation token for this agent.
    pub fn cancel(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Run the receive loop until the cancellation token fires.
    ///
    /// Each datagram is handled on its own task. Malformed datagrams,
    /// rejected communities and failed sends are logged and skipped. A
    /// failed socket read is logged and retried after a short backoff.
    #[instrument(skip(self), err, fields(snmp.local_addr = %self.local_addr()))]
    pub async fn run(&self) -> Result<()> {
        tracing::info!(target: "snmp_wire::agent", { snmp.local_addr = %self.inner.local_addr }, "agent started");
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            let (len, source) = tokio::select! {
                result = self.inner.socket.recv_from(&mut buf) => {
                    match result {
                        Ok(received) => received,
                        Err(e) => {
                            if self.recover_from_recv_error(e).await {
                                continue;
                            }
                            tracing::info!(target: "snmp_wire::agent", "agent shutdown requested");
                            return Ok(());
                        }
                    }
                }
                _ = self.inner.cancel.cancelled() => {
                    tracing::info!(target: "snmp_wire::agent", "agent shutdown requested");
                    return Ok(());
                }
            };

            let data = Bytes::copy_from_slice(&buf[..len]);
            notify(self.inner.observer.as_ref(), || TrafficEvent::Received {
                peer: source,
                data: data.clone(),
            });

            let permit = match &self.inner.concurrency_limit {
                Some(sem) => tokio::select! {
                    acquired = sem.clone().acquire_owned() => match acquired {
                        Ok(permit) => Some(permit),
                        // The semaphore is never closed
                        Err(_) => return Ok(()),
                    },
                    _ = self.inner.cancel.cancelled() => {
                        tracing::info!(target: "snmp_wire::agent", "agent shutdown requested");
                        return Ok(());
                    }
                },
                None => None,
            };

            let agent = self.clone();
            tokio::spawn(async move {
                if let Some(response) = agent.handle_datagram(data, source).await
                    && let Err(e) = agent.send_response(response, source).await
                {
                    tracing::warn!(target: "snmp_wire::agent", { snmp.source = %source, error = %e }, "failed to send response");
                }
                drop(permit);
            });
        }
    }

    /// Log a failed socket read and wait out the backoff.
    ///
    /// Returns `false` if the agent was cancelled while waiting.
    async fn recover_from_recv_error(&self, error: std::io::Error) -> bool {
        // Windows reports ICMP port unreachable from an earlier send_to as a
        // recv error
        if error.kind() == std::io::ErrorKind::ConnectionReset {
            tracing::debug!(target: "snmp_wire::agent", { error = %error }, "ignoring connection reset");
            return !self.inner.cancel.is_cancelled();
        }

        tracing::warn!(
            target: "snmp_wire::agent",
            { error = %error, backoff_ms = RECV_ERROR_BACKOFF.as_millis() as u64 },
            "agent socket read failed, retrying"
        );
        tokio::select! {
            _ = tokio::time::sleep(RECV_ERROR_BACKOFF) => true,
            _ = self.inner.cancel.cancelled() => false,
        }
    }

    /// Spawn [`run()`](Agent::run) on the current runtime.
    pub fn start(&self) -> JoinHandle<Result<()>> {
        let agent = self.clone();
        tokio::spawn(async move { agent.run().await })
    }

    /// Ask the receive loop to stop. Requests already being handled finish.
    pub fn stop(&self) {
        self.inner.cancel.cancel();
    }

    /// Compute the reply to one datagram, or `None` to drop it.
    async fn handle_datagram(&self, data: Bytes, source: SocketAddr) -> Option<Bytes> {
        let request = parse_request(data)?;

        if !self.community_allowed(request.community()) {
            tracing::debug!(
                target: "snmp_wire::agent",
                { snmp.source = %source, snmp.request_id = request.request_id() },
                "dropping request with unknown community"
            );
            return None;
        }

        let response = match request {
            Request::Get {
                version,
                request_id,
                community,
                oids,
            } => {
                let ctx = RequestContext {
                    source,
                    version,
                    community,
                    request_id,
                    pdu_type: PduType::GetRequest,
                };
                let results = self.lookup_all(&ctx, oids).await;
                build_get_response(version, request_id, &ctx.community, &results)
            }
            Request::Set {
                version,
                request_id,
                community,
                bindings,
            } => {
                let ctx = RequestContext {
                    source,
                    version,
                    community,
                    request_id,
                    pdu_type: PduType::SetRequest,
                };
                let results = self.apply_all(&ctx, bindings).await;
                build_get_response(version, request_id, &ctx.community, &results)
            }
        };

        if let Err(e) = self.check_message_size(&response) {
            tracing::warn!(
                target: "snmp_wire::agent",
                { snmp.source = %source, error = %e },
                "dropping response"
            );
            return None;
        }

        Some(response)
    }

    fn check_message_size(&self, message: &[u8]) -> Result<()> {
        let max = self.inner.max_message_size;
        if message.len() > max {
            return Err(Error::MessageTooLarge {
                size: message.len(),
                max,
            });
        }
        Ok(())
    }

    fn community_allowed(&self, community: &[u8]) -> bool {
        let communities = &self.inner.communities;
        communities.is_empty()
            || communities
                .iter()
                .any(|c| bool::from(c.as_slice().ct_eq(community)))
    }

    async fn lookup_all(&self, ctx: &RequestContext, oids: Vec<Oid>) -> Vec<(Oid, Option<Value>)> {
        let mut results = Vec::with_capacity(oids.len());
        for oid in oids {
            let value = self
                .inner
                .store
                .lookup(ctx, &oid)
                .await
                .map(Value::from);
            results.push((oid, value));
        }
        results
    }

    async fn apply_all(
        &self,
        ctx: &RequestContext,
        bindings: Vec<SetBinding>,
    ) -> Vec<(Oid, Option<Value>)> {
        let mut results = Vec::with_capacity(bindings.len());
        for binding in bindings {
            if !binding.is_octet_string() {
                tracing::debug!(
                    target: "snmp_wire::agent",
                    { snmp.source = %ctx.source, snmp.oid = %binding.oid, tag = binding.tag },
                    "rejecting SET of non-string value"
                );
                results.push((binding.oid, None));
                continue;
            }

            let text = String::from_utf8_lossy(&binding.data);
            let accepted = self.inner.store.set(ctx, &binding.oid, &text).await;
            let echoed = accepted.then(|| Value::OctetString(binding.data.clone()));
            results.push((binding.oid, echoed));
        }
        results
    }

    async fn send_response(&self, response: Bytes, dest: SocketAddr) -> Result<()> {
        self.inner
            .socket
            .send_to(&response, dest)
            .await
            .map_err(|e| Error::Io {
                target: Some(dest),
                source: e,
            })?;
        notify(self.inner.observer.as_ref(), || TrafficEvent::Sent {
            peer: dest,
            data: response,
        });
        Ok(())
    }
}
