//! # lark-proto
//!
//! Protocol library for the Lark IRC daemon.
//!
//! Covers the wire-level pieces that are independent of server state:
//!
//! - [`Message`]: parsing and serializing `VERB arg1 arg2 :trailing` lines
//! - [`Numeric`]: the static table of three-digit reply codes
//! - [`NickExt`] / [`ChannelNameExt`]: name grammar validation
//! - [`LineCodec`] (behind the `tokio` feature): CRLF/LF line framing

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod chan;
pub mod error;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod nick;
pub mod response;

pub use chan::ChannelNameExt;
pub use error::{MessageParseError, ProtocolError};
#[cfg(feature = "tokio")]
pub use line::LineCodec;
pub use message::Message;
pub use nick::NickExt;
pub use response::Numeric;
