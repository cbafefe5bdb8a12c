//! Per-connection session state.

use std::collections::BTreeSet;
use std::fmt;
use std::net::SocketAddr;

use tokio::sync::mpsc;

/// Unique connection handle, monotonically assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generator for session ids.
#[derive(Debug, Default)]
pub struct SessionIdGen {
    next: u64,
}

impl SessionIdGen {
    /// Create a generator starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next id.
    pub fn next_id(&mut self) -> SessionId {
        let id = SessionId(self.next);
        self.next += 1;
        id
    }
}

/// One client connection and everything known about it.
///
/// The outbound queue is the session's send buffer: lines pushed here are
/// drained in order by the connection's writer task, so per-client delivery
/// is FIFO.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    addr: SocketAddr,
    /// Nickname, once a valid NICK has been accepted.
    pub nick: Option<String>,
    /// Username from USER.
    pub username: Option<String>,
    /// Realname from USER.
    pub realname: String,
    /// Hostname shown in prefixes; defaults to the peer address.
    pub hostname: String,
    /// The shared connection password has been presented and matched.
    pub password_given: bool,
    /// Registration is complete. Never reset once true.
    pub registered: bool,
    channels: BTreeSet<String>,
    outbound: mpsc::UnboundedSender<String>,
}

impl Session {
    /// Create a session for a freshly accepted connection.
    pub fn new(id: SessionId, addr: SocketAddr, outbound: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id,
            addr,
            nick: None,
            username: None,
            realname: String::new(),
            hostname: addr.ip().to_string(),
            password_given: false,
            registered: false,
            channels: BTreeSet::new(),
            outbound,
        }
    }

    /// The connection handle.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The peer address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Nickname, or `*` while none is set (the reply target convention).
    pub fn nick_or_star(&self) -> &str {
        self.nick.as_deref().unwrap_or("*")
    }

    /// `nick!user@host` source prefix for lines originated by this session.
    pub fn prefix(&self) -> String {
        format!(
            "{}!{}@{}",
            self.nick.as_deref().unwrap_or("*"),
            self.username.as_deref().unwrap_or("*"),
            self.hostname
        )
    }

    /// Whether the three registration prerequisites are all satisfied.
    pub fn can_register(&self) -> bool {
        !self.registered && self.password_given && self.nick.is_some() && self.username.is_some()
    }

    /// Queue a line for transmission.
    ///
    /// A failed send means the writer task is gone; the control loop will
    /// see the corresponding close event, so the error is not a concern
    /// here.
    pub fn send(&self, line: impl Into<String>) {
        let _ = self.outbound.send(line.into());
    }

    /// Channels this session has joined.
    pub fn channels(&self) -> &BTreeSet<String> {
        &self.channels
    }

    /// Record a joined channel.
    pub fn join_channel(&mut self, name: &str) {
        self.channels.insert(name.to_string());
    }

    /// Forget a joined channel.
    pub fn leave_channel(&mut self, name: &str) {
        self.channels.remove(name);
    }
}
