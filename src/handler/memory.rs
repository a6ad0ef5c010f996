//! In-memory variable store.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::oid::Oid;

use super::{BoxFuture, RequestContext, VariableStore};

/// Thread-safe map from OID to text value.
///
/// Accepts every SET. Handy for tests and simulators.
///
/// ```rust
/// use snmp_wire::handler::MemoryStore;
/// use snmp_wire::oid;
///
/// let store = MemoryStore::new();
/// store.insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), "widget");
/// assert_eq!(store.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).as_deref(), Some("widget"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<Oid, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&self, oid: Oid, value: impl Into<String>) -> Option<String> {
        self.write().insert(oid, value.into())
    }

    pub fn get(&self, oid: &Oid) -> Option<String> {
        self.read().get(oid).cloned()
    }

    pub fn remove(&self, oid: &Oid) -> Option<String> {
        self.write().remove(oid)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A writer that panicked mid-insert leaves a valid map behind, so
    // poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<Oid, String>> {
        self.values.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<Oid, String>> {
        self.values.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl<S: Into<String>> FromIterator<(Oid, S)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (Oid, S)>>(iter: I) -> Self {
        Self {
            values: RwLock::new(iter.into_iter().map(|(o, v)| (o, v.into())).collect()),
        }
    }
}

impl VariableStore for MemoryStore {
    fn lookup<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        oid: &'a Oid,
    ) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move { self.get(oid) })
    }

    fn set<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        oid: &'a Oid,
        value: &'a str,
    ) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            self.insert(oid.clone(), value);
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::pdu::PduType;
    use crate::version::Version;
    use bytes::Bytes;
    use std::sync::Arc;

    fn ctx() -> RequestContext {
        RequestContext {
            source: "127.0.0.1:40000".parse().unwrap(),
            version: Version::V2c,
            community: Bytes::from_static(b"public"),
            request_id: 1,
            pdu_type: PduType::GetRequest,
        }
    }

    #[tokio::test]
    async fn test_lookup_and_set() {
        let store = MemoryStore::new();
        let oid = oid!(1, 3, 6, 1, 2, 1, 1, 5, 0);

        assert_eq!(store.lookup(&ctx(), &oid).await, None);
        assert!(store.set(&ctx(), &oid, "v2").await);
        assert_eq!(store.lookup(&ctx(), &oid).await.as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_from_iter() {
        let store: MemoryStore = [
            (oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), "widget"),
            (oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), "host"),
        ]
        .into_iter()
        .collect();

        assert_eq!(store.len(), 2);
        assert_eq!(store.remove(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)).as_deref(), Some("host"));
        assert!(!store.is_empty());
    }

    #[test]
    fn test_survives_poisoned_lock() {
        let store = Arc::new(MemoryStore::new());
        store.insert(oid!(1, 3, 6, 1), "before");

        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.values.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(store.values.is_poisoned());
        assert_eq!(store.get(&oid!(1, 3, 6, 1)).as_deref(), Some("before"));
        store.insert(oid!(1, 3, 6, 2), "after");
        assert_eq!(store.len(), 2);
    }
}
