//! Common test fixtures and constants.

use snmp_wire::handler::MemoryStore;
use snmp_wire::{Oid, oid};

// =============================================================================
// Standard system MIB OIDs (1.3.6.1.2.1.1.*)
// =============================================================================

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}
pub fn sys_contact() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 4, 0)
}
pub fn sys_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
}
pub fn sys_location() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 6, 0)
}

/// OID no fixture store holds.
pub fn nonexistent_oid() -> Oid {
    oid!(1, 3, 6, 1, 99, 99, 99, 0)
}

pub const SYS_DESCR_TEXT: &str = "widget";
pub const COMMUNITY: &[u8] = b"public";

/// Store with a few system MIB strings filled in.
pub fn system_store() -> MemoryStore {
    [
        (sys_descr(), SYS_DESCR_TEXT),
        (sys_contact(), "ops@example.com"),
        (sys_location(), "rack 4"),
    ]
    .into_iter()
    .collect()
}
