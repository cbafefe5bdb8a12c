//! Server state: sessions, channels, and the registries that own them.

mod channel;
mod registry;
mod session;

pub use channel::{Channel, ChannelModes, ModeChange};
pub use registry::ServerState;
pub use session::{Session, SessionId, SessionIdGen};
