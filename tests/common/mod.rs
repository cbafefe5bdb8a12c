//! Integration test common infrastructure.
//!
//! Provides an in-process test server and a line-level IRC client for
//! asserting on message flows.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;
