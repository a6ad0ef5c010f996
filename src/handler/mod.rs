//! Store binding for the agent role.
//!
//! The agent owns no data. Every GET and SET it receives is answered by a
//! [`VariableStore`]:
//!
//! - [`VariableStore`] - Trait with `lookup` and `set` callbacks
//! - [`RequestContext`] - Information about the incoming request
//! - [`MemoryStore`] - Ready-made thread-safe map
//! - [`FnStore`] - Ready-made store wrapping two closures
//!
//! ```rust
//! use snmp_wire::handler::{FnStore, MemoryStore, VariableStore};
//! use snmp_wire::oid;
//! use std::sync::Arc;
//!
//! let memory = MemoryStore::new();
//! memory.insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), "widget");
//! let store: Arc<dyn VariableStore> = Arc::new(memory);
//!
//! let computed: Arc<dyn VariableStore> =
//!     Arc::new(FnStore::new(|ctx, _oid| Some(format!("hello {}", ctx.source))));
//! ```

mod closure;
mod context;
mod memory;
mod traits;

pub use closure::FnStore;
pub use context::RequestContext;
pub use memory::MemoryStore;
pub use traits::{BoxFuture, VariableStore};
