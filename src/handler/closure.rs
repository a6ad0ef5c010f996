//! Variable store backed by closures.

use crate::oid::Oid;

use super::{BoxFuture, RequestContext, VariableStore};

type LookupFn = dyn Fn(&RequestContext, &Oid) -> Option<String> + Send + Sync;
type SetFn = dyn Fn(&RequestContext, &Oid, &str) -> bool + Send + Sync;

/// Adapts a pair of synchronous closures to [`VariableStore`].
///
/// Without a set closure the store is read-only.
///
/// ```rust
/// use snmp_wire::handler::FnStore;
///
/// let store = FnStore::new(|_ctx, oid| Some(format!("value of {}", oid)))
///     .with_set(|_ctx, _oid, value| !value.is_empty());
/// ```
pub struct FnStore {
    lookup: Box<LookupFn>,
    set: Option<Box<SetFn>>,
}

impl FnStore {
    pub fn new<L>(lookup: L) -> Self
    where
        L: Fn(&RequestContext, &Oid) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
            set: None,
        }
    }

    pub fn with_set<S>(mut self, set: S) -> Self
    where
        S: Fn(&RequestContext, &Oid, &str) -> bool + Send + Sync + 'static,
    {
        self.set = Some(Box::new(set));
        self
    }
}

impl std::fmt::Debug for FnStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStore")
            .field("writable", &self.set.is_some())
            .finish_non_exhaustive()
    }
}

impl VariableStore for FnStore {
    fn lookup<'a>(
        &'a self,
        ctx: &'a RequestContext,
        oid: &'a Oid,
    ) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move { (self.lookup)(ctx, oid) })
    }

    fn set<'a>(
        &'a self,
        ctx: &'a RequestContext,
        oid: &'a Oid,
        value: &'a str,
    ) -> BoxFuture<'a, bool> {
        Box::pin(async move { self.set.as_ref().is_some_and(|set| set(ctx, oid, value)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::pdu::PduType;
    use crate::version::Version;
    use bytes::Bytes;

    fn ctx() -> RequestContext {
        RequestContext {
            source: "127.0.0.1:40000".parse().unwrap(),
            version: Version::V1,
            community: Bytes::from_static(b"private"),
            request_id: 9,
            pdu_type: PduType::SetRequest,
        }
    }

    #[tokio::test]
    async fn test_read_only_without_set() {
        let store = FnStore::new(|_, oid| Some(oid.to_string()));
        let oid = oid!(1, 3, 6, 1);

        assert_eq!(store.lookup(&ctx(), &oid).await.as_deref(), Some("1.3.6.1"));
        assert!(!store.set(&ctx(), &oid, "x").await);
    }

    #[tokio::test]
    async fn test_set_closure_sees_context() {
        let store = FnStore::new(|_, _| None)
            .with_set(|ctx, _, value| &ctx.community[..] == b"private" && value == "ok");

        assert!(store.set(&ctx(), &oid!(1, 3, 6, 1), "ok").await);
        assert!(!store.set(&ctx(), &oid!(1, 3, 6, 1), "no").await);
    }
}
