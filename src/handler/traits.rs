//! VariableStore trait and related types.

use std::future::Future;
use std::pin::Pin;

use crate::oid::Oid;

use super::RequestContext;

/// Type alias for boxed async return type (dyn-compatible).
///
/// Store methods return `BoxFuture` so stores can be held as
/// `Arc<dyn VariableStore>` by the agent.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The agent's view of the managed variables.
///
/// Values are text: a GET answers with the stored string as an OCTET STRING,
/// and a SET hands over the received OCTET STRING decoded as UTF-8 (lossily).
///
/// # GET
///
/// [`lookup`](VariableStore::lookup) returns `None` for an unknown OID. The
/// agent still answers that OID, with NULL.
///
/// # SET
///
/// [`set`](VariableStore::set) returns whether the value was accepted. The
/// default refuses everything, making the store read-only. Each binding of a
/// SetRequest is applied on its own; there is no rollback across bindings.
///
/// # Thread Safety
///
/// Stores must be `Send + Sync` because the agent handles each datagram on
/// its own task.
///
/// # Example
///
/// ```rust
/// use snmp_wire::handler::{BoxFuture, RequestContext, VariableStore};
/// use snmp_wire::{Oid, oid};
///
/// struct Uptime;
///
/// impl VariableStore for Uptime {
///     fn lookup<'a>(&'a self, _ctx: &'a RequestContext, oid: &'a Oid) -> BoxFuture<'a, Option<String>> {
///         Box::pin(async move {
///             (oid == &oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)).then(|| "42".to_string())
///         })
///     }
/// }
/// ```
pub trait VariableStore: Send + Sync + 'static {
    /// Look up the current value of `oid`.
    fn lookup<'a>(&'a self, ctx: &'a RequestContext, oid: &'a Oid)
    -> BoxFuture<'a, Option<String>>;

    /// Store `value` under `oid`, returning whether it was accepted.
    ///
    /// Default implementation refuses (read-only store).
    fn set<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        _oid: &'a Oid,
        _value: &'a str,
    ) -> BoxFuture<'a, bool> {
        Box::pin(async { false })
    }
}
