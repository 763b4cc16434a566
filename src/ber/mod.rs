//! BER (Basic Encoding Rules) reader and writer.
//!
//! These are the byte-level primitives the codec layers consume: tagged
//! sequences, integers, booleans, octet strings, OIDs and raw octets.
//! Parsing is permissive in the same places net-snmp is permissive.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
pub use tag::*;
