//! In-process SNMP agent for testing.
//!
//! Binds an ephemeral localhost port and shuts down on drop.

use crate::common::fixtures;

use snmp_wire::agent::Agent;
use snmp_wire::handler::{MemoryStore, VariableStore};
use snmp_wire::observer::TrafficEvent;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// An in-process SNMP agent for testing.
///
/// ```ignore
/// let agent = TestAgent::new().await;
/// let client = Client::v2c(agent.addr().to_string()).connect().await?;
/// let values = client.get("1.3.6.1.2.1.1.1.0").await;
/// ```
pub struct TestAgent {
    addr: SocketAddr,
    store: Arc<MemoryStore>,
    cancel: CancellationToken,
    events: Option<mpsc::UnboundedReceiver<TrafficEvent>>,
    _task: JoinHandle<()>,
}

impl TestAgent {
    /// Agent over the fixture system store, accepting "public".
    pub async fn new() -> Self {
        Self::with_store(Arc::new(fixtures::system_store()), &[fixtures::COMMUNITY]).await
    }

    /// Agent over `store` accepting `communities` (empty accepts all).
    pub async fn with_store(store: Arc<MemoryStore>, communities: &[&[u8]]) -> Self {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let agent = Agent::builder()
            .bind("127.0.0.1:0")
            .communities(communities.iter().copied())
            .store(store.clone() as Arc<dyn VariableStore>)
            .observer(tx)
            .cancel(cancel.clone())
            .build()
            .await
            .expect("failed to build test agent");

        let addr = agent.local_addr();
        let task = tokio::spawn(async move {
            if let Err(e) = agent.run().await {
                eprintln!("TestAgent error: {}", e);
            }
        });

        Self {
            addr,
            store,
            cancel,
            events: Some(rx),
            _task: task,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The store the agent answers from.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Take the receiver of the agent's traffic events.
    pub fn take_events(&mut self) -> mpsc::UnboundedReceiver<TrafficEvent> {
        self.events.take().expect("events already taken")
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
