//! The owning registries for sessions and channels.
//!
//! All state lives here, mutated only from the control task; sessions and
//! channels refer to each other by id and name, never by owning reference.

use std::collections::HashMap;

use tracing::debug;

use crate::state::{Channel, Session, SessionId};

/// Central server state: every live session and channel.
#[derive(Debug, Default)]
pub struct ServerState {
    sessions: HashMap<SessionId, Session>,
    channels: HashMap<String, Channel>,
}

impl ServerState {
    /// Create empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted session.
    pub fn insert_session(&mut self, session: Session) {
        self.sessions.insert(session.id(), session);
    }

    /// Look up a session by handle.
    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Mutable session lookup.
    pub fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// Remove and return a session. Channel membership is the caller's
    /// problem; disconnect handling strips it before dropping the session.
    pub fn remove_session(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    /// Find a session by nickname (byte-wise comparison, linear scan).
    pub fn find_nick(&self, nick: &str) -> Option<SessionId> {
        self.sessions
            .values()
            .find(|s| s.nick.as_deref() == Some(nick))
            .map(Session::id)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Look up a channel by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    /// Mutable channel lookup.
    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.get_mut(name)
    }

    /// Get or create a channel. Idempotent: a second create for the same
    /// name returns the existing channel.
    pub fn create_channel(&mut self, name: &str) -> &mut Channel {
        self.channels
            .entry(name.to_string())
            .or_insert_with(|| Channel::new(name))
    }

    /// Whether a channel exists.
    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Destroy a channel.
    pub fn remove_channel(&mut self, name: &str) {
        if self.channels.remove(name).is_some() {
            debug!(channel = %name, "channel destroyed");
        }
    }

    /// Number of live channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Queue a line to one session, if it is still around.
    pub fn send_to(&self, id: SessionId, line: &str) {
        if let Some(session) = self.sessions.get(&id) {
            session.send(line);
        }
    }

    /// Queue a line to every member of a channel, in member-set order,
    /// optionally excluding one session (the relay-sender convention).
    pub fn broadcast_to_channel(&self, name: &str, line: &str, exclude: Option<SessionId>) {
        let Some(channel) = self.channels.get(name) else {
            return;
        };
        for &member in channel.members() {
            if Some(member) == exclude {
                continue;
            }
            self.send_to(member, line);
        }
    }
}
