//! Shared test utilities for snmp-wire integration tests.

// Not every test file uses every utility
#![allow(dead_code)]
#![allow(unused_imports)]

#[cfg(feature = "agent")]
mod agent;
mod fixtures;

#[cfg(feature = "agent")]
pub use agent::TestAgent;
pub use fixtures::*;

/// Install a tracing subscriber when `RUST_LOG` is set.
pub fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_some() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}
