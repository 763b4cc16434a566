//! Common test fixtures and constants.

use std::collections::BTreeMap;

use snmp_engine::{Oid, Value, oid};

// =============================================================================
// Standard system MIB OIDs (1.3.6.1.2.1.1.*)
// =============================================================================

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}
pub fn sys_object_id() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 2, 0)
}
pub fn sys_uptime() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
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

/// ifNumber.0, the first OID after the system subtree.
pub fn if_number() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 1, 0)
}

// =============================================================================
// Subtree roots (for walks)
// =============================================================================

/// System subtree root: 1.3.6.1.2.1.1
pub fn system_subtree() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1)
}

/// ifTable: 1.3.6.1.2.1.2.2
pub fn if_table() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2)
}

/// Nonexistent OID for testing noSuchObject / noSuchName
pub fn nonexistent_oid() -> Oid {
    oid!(1, 3, 6, 1, 99, 99, 99, 0)
}

// =============================================================================
// Agent contents
// =============================================================================

/// Read community the fake agent answers to.
pub const COMMUNITY: &str = "public";

/// system group (6 scalars), ifNumber and a 2-row ifTable with 3 columns.
pub fn standard_mib() -> BTreeMap<Oid, Value> {
    let mut mib = BTreeMap::new();
    mib.insert(sys_descr(), Value::from("Linux fake-agent 6.1.0"));
    mib.insert(
        sys_object_id(),
        Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 8072, 3, 2, 10)),
    );
    mib.insert(sys_uptime(), Value::TimeTicks(123_456));
    mib.insert(sys_contact(), Value::from("noc@example.net"));
    mib.insert(sys_name(), Value::from("fake-agent"));
    mib.insert(sys_location(), Value::from("rack 4"));
    mib.insert(if_number(), Value::Integer(2));

    let entry = if_table().child(1);
    let rows: [(u32, &str, i32); 2] = [(1, "lo", 24), (2, "eth0", 6)];
    for (index, descr, if_type) in rows {
        mib.insert(entry.child(1).child(index), Value::Integer(index as i32));
        mib.insert(entry.child(2).child(index), Value::from(descr));
        mib.insert(entry.child(3).child(index), Value::Integer(if_type));
    }
    mib
}
