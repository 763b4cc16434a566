//! CLI support for the `snmp-get`, `snmp-walk` and `snmp-table` tools.
//!
//! Argument parsing, output formatting and well-known OID names.
//!
//! This module is only available with the `cli` feature.

pub mod args;
pub mod hints;
pub mod output;
