//! Common test infrastructure
//!
//! Spins up a real server on an ephemeral port, backed by a temporary
//! database and with the external media tools disabled, so the tests
//! exercise the full HTTP surface without touching the network.

mod server;

pub use server::TestServer;
