//! Traffic observation hooks.
//!
//! Clients and agents report every datagram they send or receive to an
//! optional [`TrafficObserver`]. Observers run inline on the I/O path and
//! should return quickly; forward to a channel for anything heavier.
//!
//! ```
//! use snmp_wire::observer::{TrafficEvent, TrafficObserver};
//!
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<TrafficEvent>();
//! let observer: std::sync::Arc<dyn TrafficObserver> = std::sync::Arc::new(tx);
//! observer.on_event(&TrafficEvent::Sent {
//!     peer: "127.0.0.1:161".parse().unwrap(),
//!     data: bytes::Bytes::from_static(&[0x30, 0x00]),
//! });
//! assert!(rx.try_recv().is_ok());
//! ```

use bytes::Bytes;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Which way a datagram travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Sent => write!(f, "sent"),
            Direction::Received => write!(f, "received"),
        }
    }
}

/// One datagram as seen by a client or agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrafficEvent {
    /// A datagram went out to `peer`.
    Sent { peer: SocketAddr, data: Bytes },
    /// A datagram arrived from `peer`.
    Received { peer: SocketAddr, data: Bytes },
}

impl TrafficEvent {
    pub fn direction(&self) -> Direction {
        match self {
            TrafficEvent::Sent { .. } => Direction::Sent,
            TrafficEvent::Received { .. } => Direction::Received,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        match self {
            TrafficEvent::Sent { peer, .. } | TrafficEvent::Received { peer, .. } => *peer,
        }
    }

    pub fn data(&self) -> &Bytes {
        match self {
            TrafficEvent::Sent { data, .. } | TrafficEvent::Received { data, .. } => data,
        }
    }
}

impl fmt::Display for TrafficEvent {
    /// `sent 10.0.0.1:161 (2 bytes): 30 00`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data();
        write!(
            f,
            "{} {} ({} bytes):",
            self.direction(),
            self.peer(),
            data.len()
        )?;
        for byte in data.iter() {
            write!(f, " {:02x}", byte)?;
        }
        Ok(())
    }
}

/// Receives a callback for every datagram.
pub trait TrafficObserver: Send + Sync {
    fn on_event(&self, event: &TrafficEvent);
}

impl<F> TrafficObserver for F
where
    F: Fn(&TrafficEvent) + Send + Sync,
{
    fn on_event(&self, event: &TrafficEvent) {
        self(event)
    }
}

impl TrafficObserver for mpsc::UnboundedSender<TrafficEvent> {
    fn on_event(&self, event: &TrafficEvent) {
        // A closed receiver just means nobody is listening any more
        let _ = self.send(event.clone());
    }
}

/// Report an event if an observer is installed.
pub(crate) fn notify(
    observer: Option<&Arc<dyn TrafficObserver>>,
    make: impl FnOnce() -> TrafficEvent,
) {
    if let Some(observer) = observer {
        observer.on_event(&make());
    }
}
