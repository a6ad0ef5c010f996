//! SNMP client: the request/response correlator.
//!
//! A [`Client`] sends exactly one datagram per call and waits for the
//! matching response until its timeout. There are no retries.
//!
//! Two surfaces share the same round trip:
//!
//! - [`get`](Client::get), [`get_many`](Client::get_many), [`set`](Client::set)
//!   and [`set_many`](Client::set_many) return a map keyed by the OID strings
//!   the caller passed in. Any failure yields an empty map.
//! - [`try_get`](Client::try_get) and [`try_set`](Client::try_set) take parsed
//!   OIDs and return the varbinds or a typed [`Error`].
//!
//! ```rust,no_run
//! use snmp_wire::Client;
//! use std::time::Duration;
//!
//! # async fn example() -> snmp_wire::Result<()> {
//! let client = Client::v2c("192.0.2.1")
//!     .community(b"public")
//!     .timeout(Duration::from_secs(2))
//!     .connect()
//!     .await?;
//!
//! let values = client.get("1.3.6.1.2.1.1.1.0").await;
//! if let Some(descr) = values.get("1.3.6.1.2.1.1.1.0") {
//!     println!("sysDescr = {}", descr);
//! }
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::{V1ClientBuilder, V2cClientBuilder};

use crate::error::{Error, ErrorStatus, Result};
use crate::message::{Response, build_get_request, build_set_request, decode_response};
use crate::observer::{TrafficEvent, TrafficObserver, notify};
use crate::oid::Oid;
use crate::transport::{Transport, UdpTransport};
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;
use bytes::Bytes;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing::{Span, instrument};

/// Request-ids wrap within 1..=MAX_REQUEST_ID so they always encode as a
/// positive INTEGER of at most four content bytes.
const MAX_REQUEST_ID: u32 = i32::MAX as u32;

/// Per-client request-id source.
///
/// A monotonically increasing counter seeded from the OS random source, so
/// two clients (or two runs) are unlikely to start at the same id.
#[derive(Debug)]
pub struct RequestIdGenerator {
    next: AtomicU32,
}

impl RequestIdGenerator {
    /// Create a generator with a random starting point.
    pub fn new() -> Self {
        Self::with_seed(random_seed())
    }

    /// Create a generator with a fixed starting point.
    pub fn with_seed(seed: u32) -> Self {
        Self {
            next: AtomicU32::new(seed),
        }
    }

    /// Next id, always in 1..=i32::MAX.
    pub fn next(&self) -> u32 {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        raw % MAX_REQUEST_ID + 1
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn random_seed() -> u32 {
    let mut bytes = [0u8; 4];
    match getrandom::fill(&mut bytes) {
        Ok(()) => u32::from_ne_bytes(bytes),
        Err(e) => {
            tracing::debug!(target: "snmp_wire::client", { error = %e }, "OS random source unavailable, seeding request ids from the clock");
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
                .unwrap_or(1)
        }
    }
}

/// Client configuration.
///
/// Most users should use [`Client::v1`] or [`Client::v2c`] rather than
/// constructing this directly.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// SNMP version (default: V2c)
    pub version: Version,
    /// Community string (default: "public")
    pub community: Bytes,
    /// Request timeout (default: 5 seconds)
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: Version::V2c,
            community: Bytes::from_static(b"public"),
            timeout: Duration::from_secs(5),
        }
    }
}

/// SNMP client.
///
/// Generic over transport type, with [`UdpTransport`] as default. Cloning is
/// cheap and clones share the request-id generator.
///
/// Over a `UdpTransport` one request should be in flight at a time; a reply
/// arriving for an earlier request is discarded. Over a
/// [`SharedUdpHandle`](crate::transport::SharedUdpHandle) concurrent calls
/// are routed independently.
#[derive(Clone)]
pub struct Client<T: Transport = UdpTransport> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T: Transport> {
    transport: T,
    config: ClientConfig,
    request_ids: RequestIdGenerator,
    observer: Option<Arc<dyn TrafficObserver>>,
}

impl Client<UdpTransport> {
    /// Start building an SNMPv1 client for `target` (`host` or `host:port`).
    pub fn v1(target: impl Into<String>) -> V1ClientBuilder {
        V1ClientBuilder::new(target)
    }

    /// Start building an SNMPv2c client for `target` (`host` or `host:port`).
    pub fn v2c(target: impl Into<String>) -> V2cClientBuilder {
        V2cClientBuilder::new(target)
    }
}

impl<T: Transport> Client<T> {
    /// Create a new client with the given transport and config.
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self::with_observer(transport, config, None)
    }

    pub(crate) fn with_observer(
        transport: T,
        config: ClientConfig,
        observer: Option<Arc<dyn TrafficObserver>>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                config,
                request_ids: RequestIdGenerator::new(),
                observer,
            }),
        }
    }

    /// Get the peer (target) address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.transport.peer_addr()
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Shared transports hand out ids from their per-socket counter.
    fn next_request_id(&self) -> u32 {
        self.inner
            .transport
            .alloc_request_id()
            .unwrap_or_else(|| self.inner.request_ids.next())
    }

    /// Send one request and wait for its response.
    #[instrument(
        level = "debug",
        skip(self, data),
        fields(
            snmp.target = %self.peer_addr(),
            snmp.request_id = request_id,
            snmp.elapsed_ms = tracing::field::Empty,
        )
    )]
    async fn send_and_recv(&self, request_id: u32, data: Bytes) -> Result<Response> {
        let start = Instant::now();
        let result = self.exchange(request_id, data).await;
        Span::current().record("snmp.elapsed_ms", start.elapsed().as_millis() as u64);
        result
    }

    async fn exchange(&self, request_id: u32, data: Bytes) -> Result<Response> {
        let inner = &self.inner;
        let peer = self.peer_addr();

        inner
            .transport
            .register_request(request_id, inner.config.timeout);
        if let Err(e) = inner.transport.send(&data).await {
            inner.transport.cancel_request(request_id);
            return Err(e);
        }
        notify(inner.observer.as_ref(), || TrafficEvent::Sent { peer, data });

        let (reply, source) = inner
            .transport
            .recv(request_id, inner.config.timeout)
            .await?;
        notify(inner.observer.as_ref(), || TrafficEvent::Received {
            peer: source,
            data: reply.clone(),
        });

        let response = decode_response(reply)?;

        if response.request_id != request_id {
            return Err(Error::RequestIdMismatch {
                expected: request_id,
                actual: response.request_id,
            });
        }
        if response.version != inner.config.version {
            return Err(Error::VersionMismatch {
                expected: inner.config.version,
                actual: response.version,
            });
        }

        Ok(response)
    }

    /// Turn a non-zero error-status into [`Error::Snmp`].
    fn check_status(&self, response: &Response) -> Result<()> {
        if !response.is_error() {
            return Ok(());
        }

        let index = u32::try_from(response.error_index).unwrap_or(0);
        let oid = index
            .checked_sub(1)
            .and_then(|i| response.varbinds.get(i as usize))
            .map(|vb| vb.oid.clone());

        tracing::debug!(
            target: "snmp_wire::client",
            { snmp.target = %self.peer_addr(), snmp.request_id = response.request_id, status = %response.error_status_enum(), index },
            "agent returned an error status"
        );

        Err(Error::Snmp {
            target: Some(self.peer_addr()),
            status: ErrorStatus::from_i32(response.error_status),
            index,
            oid,
        })
    }

    /// GET the given OIDs, returning varbinds in the agent's order.
    ///
    /// An empty OID list sends nothing and returns an empty list.
    pub async fn try_get(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        if oids.is_empty() {
            return Ok(Vec::new());
        }

        let request_id = self.next_request_id();
        let config = &self.inner.config;
        let data = build_get_request(config.version, request_id, &config.community, oids);

        let response = self.send_and_recv(request_id, data).await?;
        self.check_status(&response)?;
        Ok(response.varbinds)
    }

    /// SET the given OIDs to OCTET STRING values, returning the agent's echo.
    ///
    /// An agent from this crate echoes a rejected value as NULL with
    /// error-status 0, so inspect the returned values to detect rejection.
    pub async fn try_set(&self, bindings: &[(Oid, Bytes)]) -> Result<Vec<VarBind>> {
        if bindings.is_empty() {
            return Ok(Vec::new());
        }

        let request_id = self.next_request_id();
        let config = &self.inner.config;
        let data = build_set_request(config.version, request_id, &config.community, bindings);

        let response = self.send_and_recv(request_id, data).await?;
        self.check_status(&response)?;
        Ok(response.varbinds)
    }

    /// GET a single OID.
    ///
    /// Returns a map keyed by `oid` exactly as passed in, or an empty map on
    /// timeout, transport failure, unparseable OID or malformed response.
    pub async fn get(&self, oid: &str) -> HashMap<String, Value> {
        self.get_many(&[oid]).await
    }

    /// GET several OIDs in one request.
    ///
    /// Strings that don't parse as OIDs are left out of the request and of
    /// the result, as are OIDs the response doesn't mention.
    #[instrument(skip(self, oids), fields(snmp.target = %self.peer_addr(), snmp.oid_count = oids.len()))]
    pub async fn get_many<S: AsRef<str>>(&self, oids: &[S]) -> HashMap<String, Value> {
        let requested = parse_requested(oids.iter().map(|s| s.as_ref()));
        if requested.is_empty() {
            return HashMap::new();
        }

        let request_id = self.next_request_id();
        let config = &self.inner.config;
        let list: Vec<Oid> = requested.iter().map(|(_, oid)| oid.clone()).collect();
        let data = build_get_request(config.version, request_id, &config.community, &list);

        self.collect(request_id, data, &requested).await
    }

    /// SET a single OID to a string value.
    ///
    /// The result mirrors what the agent echoed: the value when accepted,
    /// NULL when rejected.
    pub async fn set(&self, oid: &str, value: &str) -> HashMap<String, Value> {
        self.set_many(&[(oid, value)]).await
    }

    /// SET several OIDs to string values in one request.
    #[instrument(skip(self, pairs), fields(snmp.target = %self.peer_addr(), snmp.oid_count = pairs.len()))]
    pub async fn set_many<S, V>(&self, pairs: &[(S, V)]) -> HashMap<String, Value>
    where
        S: AsRef<str>,
        V: AsRef<str>,
    {
        let mut requested = Vec::with_capacity(pairs.len());
        let mut bindings = Vec::with_capacity(pairs.len());
        for (oid, value) in pairs {
            if let Some((key, oid)) = parse_one(oid.as_ref()) {
                bindings.push((oid.clone(), Bytes::copy_from_slice(value.as_ref().as_bytes())));
                requested.push((key, oid));
            }
        }
        if requested.is_empty() {
            return HashMap::new();
        }

        let request_id = self.next_request_id();
        let config = &self.inner.config;
        let data = build_set_request(config.version, request_id, &config.community, &bindings);

        self.collect(request_id, data, &requested).await
    }

    /// Run one exchange and key the response by the caller's OID strings.
    async fn collect(
        &self,
        request_id: u32,
        data: Bytes,
        requested: &[(String, Oid)],
    ) -> HashMap<String, Value> {
        let response = match self.send_and_recv(request_id, data).await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                tracing::debug!(target: "snmp_wire::client", { snmp.target = %self.peer_addr(), snmp.request_id = request_id }, "request timed out");
                return HashMap::new();
            }
            Err(e @ Error::Io { .. }) => {
                tracing::warn!(target: "snmp_wire::client", { snmp.target = %self.peer_addr(), error = %e }, "request failed");
                return HashMap::new();
            }
            Err(e) => {
                tracing::debug!(target: "snmp_wire::client", { snmp.target = %self.peer_addr(), error = %e }, "unusable response");
                return HashMap::new();
            }
        };

        // Match on the encoded form so that spellings that encode
        // identically resolve to the same response entry
        let by_encoding: HashMap<Vec<u8>, Value> = response
            .varbinds
            .into_iter()
            .map(|vb| (vb.oid.to_ber(), vb.value))
            .collect();

        requested
            .iter()
            .filter_map(|(key, oid)| {
                by_encoding
                    .get(&oid.to_ber())
                    .map(|value| (key.clone(), value.clone()))
            })
            .collect()
    }
}

fn parse_one(text: &str) -> Option<(String, Oid)> {
    match Oid::parse(text) {
        Ok(oid) if !oid.is_empty() => Some((text.to_string(), oid)),
        _ => {
            tracing::debug!(target: "snmp_wire::client", { oid = text }, "skipping unparseable OID");
            None
        }
    }
}

fn parse_requested<'a>(oids: impl Iterator<Item = &'a str>) -> Vec<(String, Oid)> {
    oids.filter_map(parse_one).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Request, build_get_response, parse_request};
    use crate::oid;
    use crate::transport::MockTransport;

    const SYS_DESCR: &str = "1.3.6.1.2.1.1.1.0";

    fn mock_client() -> (Client<MockTransport>, MockTransport) {
        let mock = MockTransport::new("192.0.2.1:161".parse().unwrap());
        let config = ClientConfig {
            timeout: Duration::from_millis(100),
            ..ClientConfig::default()
        };
        (Client::new(mock.clone(), config), mock)
    }

    fn sys_descr_response(value: Option<Value>) -> Bytes {
        build_get_response(
            Version::V2c,
            0,
            b"public",
            &[(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), value)],
        )
    }

    #[test]
    fn test_request_id_generator_range() {
        let ids = RequestIdGenerator::with_seed(MAX_REQUEST_ID - 1);
        assert_eq!(ids.next(), MAX_REQUEST_ID);
        assert_eq!(ids.next(), 1);
        assert_eq!(ids.next(), 2);

        let ids = RequestIdGenerator::with_seed(u32::MAX);
        let id = ids.next();
        assert!((1..=MAX_REQUEST_ID).contains(&id));
        assert!((1..=MAX_REQUEST_ID).contains(&ids.next()));
    }

    #[test]
    fn test_generators_are_independent() {
        let a = RequestIdGenerator::with_seed(10);
        let b = RequestIdGenerator::with_seed(10);
        assert_eq!(a.next(), 11);
        assert_eq!(a.next(), 12);
        assert_eq!(b.next(), 11);
    }

    #[tokio::test]
    async fn test_get_keys_by_caller_spelling() {
        let (client, mock) = mock_client();
        mock.queue_response(sys_descr_response(Some(Value::from("widget"))));

        let result = client.get(".1.3.6.1.2.1.1.1.0").await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[".1.3.6.1.2.1.1.1.0"], Value::from("widget"));

        let sent = mock.requests();
        assert_eq!(sent.len(), 1);
        let Some(Request::Get { oids, request_id, .. }) = parse_request(sent[0].data.clone()) else {
            panic!("client sent something other than a GetRequest");
        };
        assert_eq!(oids, vec![oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)]);
        assert_eq!(Some(request_id), sent[0].request_id);
    }

    #[tokio::test]
    async fn test_get_many_omits_unparseable_and_missing() {
        let (client, mock) = mock_client();
        mock.queue_response(sys_descr_response(Some(Value::from("widget"))));

        let result = client
            .get_many(&[SYS_DESCR, "not.an.oid", "1.3.6.1.2.1.1.5.0"])
            .await;
        assert_eq!(result.len(), 1);
        assert!(result.contains_key(SYS_DESCR));
    }

    #[tokio::test]
    async fn test_all_unparseable_sends_nothing() {
        let (client, mock) = mock_client();
        assert!(client.get("garbage").await.is_empty());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failures_yield_empty_map() {
        let (client, mock) = mock_client();
        mock.queue_timeout();
        mock.queue_io_error("network unreachable");
        mock.queue_response(Bytes::from_static(&[0x30, 0x01, 0x00]));

        assert!(client.get(SYS_DESCR).await.is_empty());
        assert!(client.get(SYS_DESCR).await.is_empty());
        assert!(client.get(SYS_DESCR).await.is_empty());
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_try_get_reports_timeout() {
        let (client, mock) = mock_client();
        mock.queue_timeout();

        let err = client
            .try_get(&[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)])
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        // No retry
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_try_get_request_id_mismatch() {
        let (client, mock) = mock_client();
        mock.queue_raw_response(sys_descr_response(None));

        let err = client
            .try_get(&[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RequestIdMismatch { actual: 0, .. }));
    }

    #[tokio::test]
    async fn test_try_get_surfaces_error_status() {
        let (client, mock) = mock_client();
        let msg = crate::message::CommunityMessage::new(
            Version::V2c,
            Bytes::from_static(b"public"),
            crate::pdu::Pdu {
                pdu_type: crate::pdu::PduType::Response,
                request_id: 0,
                error_status: 2,
                error_index: 1,
                varbinds: vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))],
            },
        );
        mock.queue_response(msg.encode());

        let err = client
            .try_get(&[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Snmp {
                status: ErrorStatus::NoSuchName,
                index: 1,
                oid: Some(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_version_mismatch() {
        let (client, mock) = mock_client();
        mock.queue_response(build_get_response(Version::V1, 0, b"public", &[]));

        let err = client
            .try_get(&[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VersionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_set_sends_octet_strings() {
        let (client, mock) = mock_client();
        mock.queue_response(sys_descr_response(Some(Value::from("v2"))));

        let result = client.set(SYS_DESCR, "v2").await;
        assert_eq!(result[SYS_DESCR], Value::from("v2"));

        let Some(Request::Set { bindings, .. }) = parse_request(mock.requests()[0].data.clone())
        else {
            panic!("client sent something other than a SetRequest");
        };
        assert!(bindings[0].is_octet_string());
        assert_eq!(&bindings[0].data[..], b"v2");
    }

    #[tokio::test]
    async fn test_observer_sees_both_directions() {
        let mock = MockTransport::new("192.0.2.1:161".parse().unwrap());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let observer: Arc<dyn TrafficObserver> = Arc::new(tx);
        let client = Client::with_observer(mock.clone(), ClientConfig::default(), Some(observer));
        mock.queue_response(sys_descr_response(None));

        client.get(SYS_DESCR).await;

        let sent = rx.try_recv().unwrap();
        let received = rx.try_recv().unwrap();
        assert!(matches!(sent, TrafficEvent::Sent { .. }));
        assert!(matches!(received, TrafficEvent::Received { .. }));
        assert_eq!(sent.data(), &mock.requests()[0].data);
    }
}
