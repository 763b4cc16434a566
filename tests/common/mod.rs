//! Shared test utilities for snmp-engine integration tests.

// Not every test file uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

mod agent;
mod fixtures;
mod stream;

pub use agent::*;
pub use fixtures::*;
pub use stream::collect_stream;

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use snmp_engine::{Engine, EngineBuilder};

/// Builder for an engine on an ephemeral loopback port.
pub fn loopback_builder() -> EngineBuilder {
    Engine::builder()
        .interface(IpAddr::V4(Ipv4Addr::LOCALHOST))
        .port(0)
        .timeout(Duration::from_millis(200))
}

/// Route engine logs to the test harness; `RUST_LOG` controls the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
