//! Prelude module for convenient imports.
//!
//! ```rust,no_run
//! use snmp_engine::prelude::*;
//! ```
//!
//! This imports:
//! - Engine types: [`Engine`], [`Client`], [`ClientOptions`]
//! - Data types: [`Oid`], [`Value`], [`VarBind`], [`Version`]
//! - Error handling: [`Error`], [`Result`]
//! - The [`oid!`] macro for compile-time OID construction

pub use crate::client::Client;
pub use crate::engine::Engine;
pub use crate::error::{Error, Result};
pub use crate::message::ClientOptions;
pub use crate::oid::Oid;
pub use crate::value::Value;
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;
