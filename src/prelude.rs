//! Prelude module for convenient imports.
//!
//! ```rust,no_run
//! use snmp_wire::prelude::*;
//! ```
//!
//! This imports:
//! - Core types: [`Client`], [`Oid`], [`Value`], [`VarBind`], [`Version`]
//! - Error handling: [`Error`], [`Result`]
//! - Agent side: [`VariableStore`], [`MemoryStore`] (and `Agent` with the
//!   `agent` feature)
//! - The [`oid!`] macro

#[cfg(feature = "agent")]
pub use crate::agent::Agent;
pub use crate::client::Client;
pub use crate::error::{Error, Result};
pub use crate::handler::{MemoryStore, VariableStore};
pub use crate::oid::Oid;
pub use crate::value::Value;
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;
