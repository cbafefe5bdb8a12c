//! The server: listener, control loop, and connection lifecycle.
//!
//! All session/channel/registry mutation happens here, on one task, driven
//! by accepted connections and the event channel fed by the per-connection
//! reader tasks. One dispatched command is therefore atomic with respect to
//! every other session's view, and no locking is needed anywhere.

use std::io;
use std::net::SocketAddr;

use chrono::Utc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tracing::{info, trace, warn};

use crate::config::Config;
use crate::error::HandlerError;
use crate::handlers::{Context, Registry};
use crate::network::spawn_connection;
use crate::state::{ServerState, Session, SessionId, SessionIdGen};

/// Events flowing from connection tasks to the control loop.
#[derive(Debug)]
pub enum Event {
    /// One complete line arrived on a connection.
    Line {
        /// Originating session.
        id: SessionId,
        /// The line, terminator stripped.
        line: String,
    },
    /// A connection ended: peer close, read/write failure, or framing
    /// violation.
    Closed {
        /// Originating session.
        id: SessionId,
        /// Reason quoted in the QUIT broadcast to the session's channels.
        reason: String,
    },
}

/// This server's identity, shared with every handler.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    /// Server name quoted in numeric replies.
    pub name: String,
    /// Network name.
    pub network: String,
    /// Software version quoted in the welcome burst.
    pub version: String,
    /// Human-readable startup time quoted in RPL_CREATED.
    pub created: String,
    /// The shared connection password.
    pub password: String,
}

/// Fatal construction errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("password cannot be empty")]
    EmptyPassword,

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Backpressure bound for the event funnel. Readers park when the control
/// loop falls this far behind; per-session send buffers stay unbounded.
const EVENT_CHANNEL_SIZE: usize = 1024;

/// The relay server.
pub struct Server {
    listener: TcpListener,
    info: ServerInfo,
    state: ServerState,
    registry: Registry,
    ids: SessionIdGen,
    events_tx: mpsc::Sender<Event>,
    events_rx: mpsc::Receiver<Event>,
}

impl Server {
    /// Bind the listening socket and assemble the server.
    ///
    /// An empty password or a failed bind is fatal here, before the event
    /// loop ever starts.
    pub async fn bind(config: Config, password: impl Into<String>) -> Result<Self, ServerError> {
        let password = password.into();
        if password.is_empty() {
            return Err(ServerError::EmptyPassword);
        }
        let addr = config.listen.address;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        let info = ServerInfo {
            name: config.server.name,
            network: config.server.network,
            version: env!("CARGO_PKG_VERSION").to_string(),
            created: Utc::now().format("%a %b %e %Y at %H:%M:%S UTC").to_string(),
            password,
        };
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);

        info!(server = %info.name, network = %info.network, %addr, "listener bound");

        Ok(Self {
            listener,
            info,
            state: ServerState::new(),
            registry: Registry::new(),
            ids: SessionIdGen::new(),
            events_tx,
            events_rx,
        })
    }

    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the control loop until `shutdown` fires.
    ///
    /// Shutdown is observed between iterations, never mid-dispatch.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("entering event loop");
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => self.accept(stream, addr),
                    // Accept failures are transient (the listener itself is
                    // fine); nothing to tear down.
                    Err(e) => warn!(error = %e, "accept failed"),
                },
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                _ = shutdown.changed() => {
                    info!("shutdown requested");
                    break;
                }
            }
        }
        info!(
            clients = self.state.session_count(),
            channels = self.state.channel_count(),
            "event loop stopped"
        );
    }

    fn accept(&mut self, stream: TcpStream, addr: SocketAddr) {
        let id = self.ids.next_id();
        let outbound = spawn_connection(id, stream, self.events_tx.clone());
        self.state.insert_session(Session::new(id, addr, outbound));
        info!(%id, %addr, clients = self.state.session_count(), "client connected");
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Line { id, line } => {
                // The session may have been torn down with lines still
                // queued behind the event; drop those silently.
                if self.state.session(id).is_none() {
                    trace!(%id, "line from removed session dropped");
                    return;
                }
                let mut ctx = Context {
                    id,
                    state: &mut self.state,
                    server: &self.info,
                };
                match self.registry.dispatch(&mut ctx, &line) {
                    Ok(()) => {}
                    Err(HandlerError::Quit(reason)) => {
                        let reason = reason.unwrap_or_else(|| "Client quit".to_string());
                        self.disconnect(id, &reason);
                    }
                    Err(_) => {}
                }
            }
            Event::Closed { id, reason } => self.disconnect(id, &reason),
        }
    }

    /// Tear down one session: announce the quit to its channels, strip its
    /// membership everywhere, and destroy channels it leaves empty.
    ///
    /// Idempotent; a session can close from both its reader and writer.
    fn disconnect(&mut self, id: SessionId, reason: &str) {
        let Some(session) = self.state.remove_session(id) else {
            return;
        };
        info!(%id, nick = %session.nick_or_star(), %reason, "client disconnected");

        let quit_line = format!(":{} QUIT :{}", session.prefix(), reason);
        for name in session.channels() {
            let empty = match self.state.channel_mut(name) {
                Some(chan) => {
                    chan.remove_member(id);
                    chan.is_empty()
                }
                None => continue,
            };
            if empty {
                self.state.remove_channel(name);
            } else {
                self.state.broadcast_to_channel(name, &quit_line, None);
            }
        }
        // Dropping the session drops its outbound sender; the writer task
        // flushes the queued tail and closes the socket.
    }
}
