//! Mock transport for client unit tests.
//!
//! Replays scripted outcomes without touching the network and records every
//! request the client sends.

use super::Transport;
use crate::error::{Error, Result};
use crate::message::{CommunityMessage, extract_request_id};
use bytes::Bytes;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A scripted outcome for one `recv` call.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Return this message with its request-id patched to the request's.
    Data(Bytes),
    /// Return this data untouched (for request-id mismatch scenarios).
    RawData(Bytes),
    /// Simulate a timeout.
    Timeout,
    /// Simulate an I/O error.
    IoError(String),
}

/// A request sent through the mock transport.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub data: Bytes,
    pub request_id: Option<u32>,
}

struct MockTransportInner {
    target: SocketAddr,
    responses: VecDeque<MockResponse>,
    requests: Vec<RecordedRequest>,
}

/// Programmable transport for exercising [`Client`](crate::Client) offline.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl MockTransport {
    pub fn new(target: SocketAddr) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTransportInner {
                target,
                responses: VecDeque::new(),
                requests: Vec::new(),
            })),
        }
    }

    /// Queue a response; its request-id is rewritten to match the request.
    pub fn queue_response(&self, data: impl Into<Bytes>) {
        self.push(MockResponse::Data(data.into()));
    }

    /// Queue a response returned exactly as given.
    pub fn queue_raw_response(&self, data: impl Into<Bytes>) {
        self.push(MockResponse::RawData(data.into()));
    }

    pub fn queue_timeout(&self) {
        self.push(MockResponse::Timeout);
    }

    pub fn queue_io_error(&self, msg: impl Into<String>) {
        self.push(MockResponse::IoError(msg.into()));
    }

    /// All requests sent so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    fn push(&self, response: MockResponse) {
        self.inner.lock().unwrap().responses.push_back(response);
    }

    fn patch_request_id(data: Bytes, request_id: u32) -> Bytes {
        match CommunityMessage::decode(data.clone()) {
            Ok(mut msg) => {
                msg.pdu.request_id = request_id;
                msg.encode()
            }
            Err(_) => data,
        }
    }
}

impl Transport for MockTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        let request_id = extract_request_id(data);
        self.inner.lock().unwrap().requests.push(RecordedRequest {
            data: Bytes::copy_from_slice(data),
            request_id,
        });
        Ok(())
    }

    async fn recv(&self, request_id: u32, timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let (response, target) = {
            let mut inner = self.inner.lock().unwrap();
            (inner.responses.pop_front(), inner.target)
        };

        match response {
            Some(MockResponse::Data(data)) => Ok((Self::patch_request_id(data, request_id), target)),
            // A real transport would discard a mismatch; surface it so the
            // client's own check is exercised
            Some(MockResponse::RawData(data)) => Ok((data, target)),
            Some(MockResponse::IoError(msg)) => Err(Error::Io {
                target: Some(target),
                source: std::io::Error::other(msg),
            }),
            Some(MockResponse::Timeout) | None => Err(Error::Timeout {
                target: Some(target),
                elapsed: timeout,
                request_id,
            }),
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.inner.lock().unwrap().target
    }

    fn local_addr(&self) -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }
}
