// The Error enum carries OIDs and addresses inline for diagnostics.
#![allow(clippy::result_large_err)]

//! # snmp-engine
//!
//! Async SNMPv1/v2c manager engine for Tokio.
//!
//! ## Features
//!
//! - Zero-copy BER encoding/decoding of messages, PDUs and values
//! - One event loop per engine correlating responses by request ID
//! - Per-request retry timers with exactly-once completion
//! - Subtree walks as a [`Stream`](futures_core::Stream) and table reconstruction
//! - v1 and v2c traps, informs and an optional trap listener
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snmp_engine::{ClientOptions, Engine, oid};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> snmp_engine::Result<()> {
//!     let engine = Engine::builder()
//!         .port(0)
//!         .retries(2)
//!         .timeout(Duration::from_secs(2))
//!         .bind()
//!         .await?;
//!
//!     let client = engine.client("192.0.2.1:161".parse().unwrap(), ClientOptions::default());
//!     let table = client.table(&oid!(1, 3, 6, 1, 2, 1, 2, 2)).await?;
//!     for (index, cells) in table.rows() {
//!         println!("{index}: {cells:?}");
//!     }
//!
//!     engine.close().await;
//!     Ok(())
//! }
//! ```

pub mod ber;
pub mod client;
pub mod engine;
pub mod error;
pub mod handler;
pub mod ledger;
pub mod message;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod util;

#[cfg(feature = "cli")]
pub mod cli;

pub use client::{Client, Table, Walk};
pub use engine::{Engine, EngineBuilder, EngineConfig, RequestState, StatsSnapshot};
pub use error::{Error, ErrorStatus, Result};
pub use handler::{MessageHandler, Role};
pub use message::{ClientOptions, CommunityMessage};
pub use oid::Oid;
pub use pdu::{GenericTrap, Pdu, PduType};
pub use value::{RawValue, Value, ValueType};
pub use varbind::VarBind;
pub use version::Version;
