//! larkd - Lark IRC Daemon
//!
//! A single-process chat relay speaking a line-oriented IRC-like protocol:
//! one shared connection password, named channels with access-control
//! modes, and message relay with per-client FIFO ordering. All state is
//! mutated from one control task; connection I/O runs on per-socket tasks
//! that funnel parsed lines back to it.

pub mod config;
pub mod error;
pub mod handlers;
pub mod network;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::{Server, ServerError};
