//! Well-known OID names for display and argument parsing.
//!
//! A small fixed table, not MIB support. Instance OIDs are named after the
//! longest known prefix, so `1.3.6.1.2.1.2.2.1.2.3` shows as `ifDescr.3`.

use crate::oid::Oid;

static WELL_KNOWN_OIDS: &[(&[u32], &str)] = &[
    // SNMPv2-MIB::system
    (&[1, 3, 6, 1, 2, 1, 1], "system"),
    (&[1, 3, 6, 1, 2, 1, 1, 1], "sysDescr"),
    (&[1, 3, 6, 1, 2, 1, 1, 2], "sysObjectID"),
    (&[1, 3, 6, 1, 2, 1, 1, 3], "sysUpTime"),
    (&[1, 3, 6, 1, 2, 1, 1, 4], "sysContact"),
    (&[1, 3, 6, 1, 2, 1, 1, 5], "sysName"),
    (&[1, 3, 6, 1, 2, 1, 1, 6], "sysLocation"),
    (&[1, 3, 6, 1, 2, 1, 1, 7], "sysServices"),
    // IF-MIB
    (&[1, 3, 6, 1, 2, 1, 2], "interfaces"),
    (&[1, 3, 6, 1, 2, 1, 2, 1], "ifNumber"),
    (&[1, 3, 6, 1, 2, 1, 2, 2], "ifTable"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1], "ifEntry"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 1], "ifIndex"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 2], "ifDescr"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 3], "ifType"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 5], "ifSpeed"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 7], "ifAdminStatus"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 8], "ifOperStatus"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 10], "ifInOctets"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1, 16], "ifOutOctets"),
    // SNMPv2-MIB notification objects
    (&[1, 3, 6, 1, 6, 3, 1, 1, 4, 1], "snmpTrapOID"),
    (&[1, 3, 6, 1, 6, 3, 1, 1, 4, 3], "snmpTrapEnterprise"),
    (&[1, 3, 6, 1, 6, 3, 1, 1, 5], "snmpTraps"),
];

/// Exact-match name for an OID.
pub fn lookup(oid: &Oid) -> Option<&'static str> {
    let arcs = oid.arcs();
    WELL_KNOWN_OIDS
        .iter()
        .find(|(known, _)| *known == arcs)
        .map(|(_, name)| *name)
}

/// Name an OID by its longest known prefix plus the remaining arcs.
pub fn describe(oid: &Oid) -> Option<String> {
    let arcs = oid.arcs();
    let (known, name) = WELL_KNOWN_OIDS
        .iter()
        .filter(|(known, _)| arcs.starts_with(known))
        .max_by_key(|(known, _)| known.len())?;
    let mut out = String::from(*name);
    for arc in &arcs[known.len()..] {
        out.push('.');
        out.push_str(&arc.to_string());
    }
    Some(out)
}

/// Parse dotted notation or a well-known name with an optional suffix.
///
/// Accepts `1.3.6.1.2.1.1.1.0`, `sysDescr.0`, `ifTable` and so on; names
/// are matched case-insensitively.
pub fn parse_oid(s: &str) -> Result<Oid, String> {
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        return Oid::parse(s).map_err(|e| format!("invalid OID '{}': {}", s, e));
    }

    let (name, suffix) = s.split_once('.').unwrap_or((s, ""));
    let Some((arcs, _)) = WELL_KNOWN_OIDS
        .iter()
        .find(|(_, known)| known.eq_ignore_ascii_case(name))
    else {
        return Err(format!(
            "unknown OID name '{}'; use dotted notation (e.g. 1.3.6.1.2.1.1.1.0)",
            name
        ));
    };

    // instance suffixes are plain arcs, not OIDs in their own right
    let mut oid = Oid::from_slice(arcs);
    if !suffix.is_empty() {
        for part in suffix.split('.') {
            let arc = part
                .parse::<u32>()
                .map_err(|_| format!("invalid OID suffix in '{}': bad arc '{}'", s, part))?;
            oid = oid.child(arc);
        }
    }
    Ok(oid)
}
