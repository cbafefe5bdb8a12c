//! Network plumbing: per-connection reader and writer tasks.

mod connection;

pub use connection::spawn_connection;
