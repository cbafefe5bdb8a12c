//! Channel state and the admission/privilege rules attached to it.

use std::collections::BTreeSet;

use crate::error::ChannelError;
use crate::state::SessionId;

/// Channel access-control modes.
///
/// The `k` flag is synonymous with a stored key and `l` with a positive
/// limit; there is no separate boolean to drift out of sync.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChannelModes {
    /// +i: joining requires an invite.
    pub invite_only: bool,
    /// +t: topic changes restricted to operators.
    pub topic_protected: bool,
    /// +k: key required to join.
    pub key: Option<String>,
    /// +l: member limit.
    pub limit: Option<u32>,
}

impl ChannelModes {
    /// Active flag letters in `itkl` order, without parameters.
    pub fn flags(&self) -> String {
        let mut s = String::new();
        if self.invite_only {
            s.push('i');
        }
        if self.topic_protected {
            s.push('t');
        }
        if self.key.is_some() {
            s.push('k');
        }
        if self.limit.is_some() {
            s.push('l');
        }
        s
    }
}

/// One parsed mode mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeChange {
    /// ±i
    InviteOnly(bool),
    /// ±t
    TopicProtected(bool),
    /// +k key / -k. `None` (or an empty key) clears.
    Key(Option<String>),
    /// +l limit / -l. `None` or zero clears.
    Limit(Option<u32>),
}

/// A named group of sessions with shared topic and access modes.
///
/// Members, operators, and invitees are referenced by session id only;
/// the sessions themselves live in the session registry. Ordered sets keep
/// broadcast iteration deterministic.
#[derive(Debug)]
pub struct Channel {
    name: String,
    members: BTreeSet<SessionId>,
    operators: BTreeSet<SessionId>,
    invited: BTreeSet<SessionId>,
    topic: String,
    modes: ChannelModes,
}

impl Channel {
    /// Create an empty channel.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: BTreeSet::new(),
            operators: BTreeSet::new(),
            invited: BTreeSet::new(),
            topic: String::new(),
            modes: ChannelModes::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &BTreeSet<SessionId> {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_member(&self, id: SessionId) -> bool {
        self.members.contains(&id)
    }

    pub fn is_operator(&self, id: SessionId) -> bool {
        self.operators.contains(&id)
    }

    pub fn is_invited(&self, id: SessionId) -> bool {
        self.invited.contains(&id)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn modes(&self) -> &ChannelModes {
        &self.modes
    }

    /// Check the admission gates without mutating anything.
    ///
    /// Fixed check order: key, then limit, then invite-only. When several
    /// gates would reject at once, the first in that order names the error.
    pub fn check_admission(&self, id: SessionId, key: &str) -> Result<(), ChannelError> {
        if let Some(required) = &self.modes.key {
            if key != required {
                return Err(ChannelError::BadChannelKey);
            }
        }
        if let Some(limit) = self.modes.limit {
            if self.members.len() >= limit as usize {
                return Err(ChannelError::ChannelIsFull);
            }
        }
        if self.modes.invite_only && !self.invited.contains(&id) {
            return Err(ChannelError::InviteOnlyChan);
        }
        Ok(())
    }

    /// Admit a session. Existing members pass without re-running the gates.
    /// On success any pending invite for the session is consumed.
    pub fn join(&mut self, id: SessionId, key: &str) -> Result<(), ChannelError> {
        if self.members.contains(&id) {
            return Ok(());
        }
        self.check_admission(id, key)?;
        self.members.insert(id);
        self.invited.remove(&id);
        Ok(())
    }

    /// Remove a session from members, operators, and the invite list.
    /// Returns whether it was a member.
    pub fn remove_member(&mut self, id: SessionId) -> bool {
        self.operators.remove(&id);
        self.invited.remove(&id);
        self.members.remove(&id)
    }

    /// Promote a member to operator. Non-members cannot be promoted.
    pub fn grant_operator(&mut self, id: SessionId) -> bool {
        if !self.members.contains(&id) {
            return false;
        }
        self.operators.insert(id);
        true
    }

    /// Demote an operator.
    pub fn revoke_operator(&mut self, id: SessionId) -> bool {
        self.operators.remove(&id)
    }

    /// Apply one mode mutation.
    ///
    /// With a caller supplied, the caller must be a current operator or the
    /// change is refused; internal calls pass `None` and bypass the check.
    pub fn apply_mode(&mut self, caller: Option<SessionId>, change: ModeChange) -> bool {
        if let Some(caller) = caller {
            if !self.is_operator(caller) {
                return false;
            }
        }
        match change {
            ModeChange::InviteOnly(on) => self.modes.invite_only = on,
            ModeChange::TopicProtected(on) => self.modes.topic_protected = on,
            ModeChange::Key(key) => {
                self.modes.key = key.filter(|k| !k.is_empty());
            }
            ModeChange::Limit(limit) => {
                self.modes.limit = limit.filter(|&n| n > 0);
            }
        }
        true
    }

    /// Set the topic, honoring the +t restriction for non-operator callers.
    pub fn set_topic(&mut self, caller: Option<SessionId>, text: &str) -> bool {
        if self.modes.topic_protected {
            if let Some(caller) = caller {
                if !self.is_operator(caller) {
                    return false;
                }
            }
        }
        self.topic = text.to_string();
        true
    }

    /// Record an invite for `target`. Only operators may extend invites.
    pub fn invite(&mut self, caller: SessionId, target: SessionId) -> bool {
        if !self.is_operator(caller) {
            return false;
        }
        self.invited.insert(target);
        true
    }

    /// Eject `target`. Requires an operator caller and a member target;
    /// anything else is a no-op.
    pub fn kick(&mut self, caller: SessionId, target: SessionId) -> bool {
        if !self.is_operator(caller) || !self.is_member(target) {
            return false;
        }
        self.remove_member(target)
    }
}
