//! Builders for SNMP clients.
//!
//! # Entry Points
//!
//! - [`Client::v1()`] - SNMPv1 with community string
//! - [`Client::v2c()`] - SNMPv2c with community string
//!
//! Both builders take the same options. Targets without a port get 161.
//!
//! ```rust,no_run
//! # use snmp_wire::Client;
//! # use std::time::Duration;
//! # async fn example() -> snmp_wire::Result<()> {
//! let client = Client::v1("192.0.2.1:161")
//!     .community(b"private")
//!     .timeout(Duration::from_millis(500))
//!     .observer(|event: &snmp_wire::observer::TrafficEvent| println!("{}", event))
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;
use crate::observer::TrafficObserver;
use crate::transport::{Transport, UdpTransport};
use crate::util::resolve_target;
use crate::version::Version;

use super::{Client, ClientConfig};

/// Common configuration shared by all builder types.
struct BaseConfig {
    target: String,
    community: Bytes,
    timeout: Duration,
    observer: Option<Arc<dyn TrafficObserver>>,
}

impl BaseConfig {
    fn new(target: impl Into<String>) -> Self {
        let defaults = ClientConfig::default();
        Self {
            target: target.into(),
            community: defaults.community,
            timeout: defaults.timeout,
            observer: None,
        }
    }

    fn into_client<T: Transport>(self, version: Version, transport: T) -> Client<T> {
        let config = ClientConfig {
            version,
            community: self.community,
            timeout: self.timeout,
        };
        Client::with_observer(transport, config, self.observer)
    }
}

// Both builders differ only in the version they stamp on the config
macro_rules! community_builder {
    ($(#[$doc:meta])* $builder:ident, $version:expr) => {
        $(#[$doc])*
        pub struct $builder {
            base: BaseConfig,
        }

        impl $builder {
            pub(crate) fn new(target: impl Into<String>) -> Self {
                Self {
                    base: BaseConfig::new(target),
                }
            }

            /// Set the community string (default: "public").
            pub fn community(mut self, community: &[u8]) -> Self {
                self.base.community = Bytes::copy_from_slice(community);
                self
            }

            /// Set the request timeout (default: 5 seconds).
            pub fn timeout(mut self, timeout: Duration) -> Self {
                self.base.timeout = timeout;
                self
            }

            /// Report every datagram sent or received to `observer`.
            pub fn observer(mut self, observer: impl TrafficObserver + 'static) -> Self {
                self.base.observer = Some(Arc::new(observer));
                self
            }

            /// Resolve the target and create the client with an owned UDP transport.
            pub async fn connect(self) -> Result<Client<UdpTransport>> {
                let addr = resolve_target(&self.base.target).await?;
                let transport = UdpTransport::connect(addr).await?;
                Ok(self.build(transport))
            }

            /// Build the client with a pre-supplied transport.
            ///
            /// The target string is not used; the transport decides the peer.
            pub fn build<T: Transport>(self, transport: T) -> Client<T> {
                self.base.into_client($version, transport)
            }
        }
    };
}

community_builder!(
    /// Builder for SNMPv1 clients.
    ///
    /// Created via [`Client::v1()`].
    V1ClientBuilder,
    Version::V1
);

community_builder!(
    /// Builder for SNMPv2c clients.
    ///
    /// Created via [`Client::v2c()`].
    V2cClientBuilder,
    Version::V2c
);
