//! Command handlers and the dispatcher.
//!
//! One incoming line is parsed into a [`Message`], routed through the
//! [`Registry`]'s verb table, and handled against server state via the
//! [`Context`]. Handlers are the sole writers of numeric replies. They run
//! on the control task and never block: every side effect is a state
//! mutation or a push onto a session's send buffer.

pub mod helpers;

mod channel;
mod connection;
mod messaging;
mod mode;

use std::collections::HashMap;

use lark_proto::{Message, Numeric};
use tracing::{debug, trace};

use crate::error::{HandlerError, HandlerResult};
use crate::server::ServerInfo;
use crate::state::{ServerState, Session, SessionId};

use channel::{InviteHandler, JoinHandler, KickHandler, NamesHandler, PartHandler, TopicHandler};
use connection::{NickHandler, PassHandler, PingHandler, QuitHandler, UserHandler};
use helpers::numeric_line;
use messaging::{NoticeHandler, PrivmsgHandler};
use mode::ModeHandler;

/// Everything a handler may see and touch for one command.
pub struct Context<'a> {
    /// The session the command arrived on.
    pub id: SessionId,
    /// All server state.
    pub state: &'a mut ServerState,
    /// This server's identity and shared password.
    pub server: &'a ServerInfo,
}

impl Context<'_> {
    /// The dispatching session.
    pub fn session(&self) -> Result<&Session, HandlerError> {
        self.state.session(self.id).ok_or(HandlerError::SessionGone)
    }

    /// The dispatching session, mutably.
    pub fn session_mut(&mut self) -> Result<&mut Session, HandlerError> {
        self.state
            .session_mut(self.id)
            .ok_or(HandlerError::SessionGone)
    }

    /// Queue a numeric reply to the dispatching session.
    pub fn reply(&self, num: Numeric, tail: &str) {
        if let Ok(session) = self.session() {
            session.send(numeric_line(
                &self.server.name,
                num,
                session.nick_or_star(),
                tail,
            ));
        }
    }
}

/// Trait implemented by all command handlers.
pub trait Handler: Send + Sync {
    /// Whether this command is gated on completed registration.
    /// Gated commands from unregistered sessions are ignored uniformly
    /// by the dispatcher.
    fn needs_registration(&self) -> bool {
        true
    }

    /// Handle one parsed message.
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult;
}

/// Registry of command handlers: the verb table.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
}

impl Registry {
    /// Create a registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        // Connection/registration handlers
        handlers.insert("PASS", Box::new(PassHandler));
        handlers.insert("NICK", Box::new(NickHandler));
        handlers.insert("USER", Box::new(UserHandler));
        handlers.insert("PING", Box::new(PingHandler));
        handlers.insert("QUIT", Box::new(QuitHandler));

        // Channel handlers
        handlers.insert("JOIN", Box::new(JoinHandler));
        handlers.insert("PART", Box::new(PartHandler));
        handlers.insert("NAMES", Box::new(NamesHandler));
        handlers.insert("TOPIC", Box::new(TopicHandler));
        handlers.insert("INVITE", Box::new(InviteHandler));
        handlers.insert("KICK", Box::new(KickHandler));
        handlers.insert("MODE", Box::new(ModeHandler));

        // Messaging handlers
        handlers.insert("PRIVMSG", Box::new(PrivmsgHandler));
        handlers.insert("NOTICE", Box::new(NoticeHandler));

        Self { handlers }
    }

    /// Parse and dispatch one raw line from a session.
    ///
    /// Protocol errors are converted to numeric replies here and consume
    /// the command; only a client-requested quit (and a vanished session)
    /// escape to the control loop.
    pub fn dispatch(&self, ctx: &mut Context<'_>, line: &str) -> HandlerResult {
        let Ok(msg) = Message::parse(line) else {
            return Ok(());
        };

        let Some(handler) = self.handlers.get(msg.command.as_str()) else {
            debug!(id = %ctx.id, command = %msg.command, "unknown command");
            ctx.reply(
                Numeric::ERR_UNKNOWNCOMMAND,
                &format!("{} :{}", msg.command, Numeric::ERR_UNKNOWNCOMMAND.text()),
            );
            return Ok(());
        };

        if handler.needs_registration() && !ctx.session()?.registered {
            trace!(id = %ctx.id, command = %msg.command, "ignoring command from unregistered session");
            return Ok(());
        }

        match handler.handle(ctx, &msg) {
            Ok(()) => Ok(()),
            Err(err @ HandlerError::Quit(_)) => Err(err),
            Err(HandlerError::SessionGone) => Ok(()),
            Err(err) => {
                let session = ctx.session()?;
                if let Some(reply) =
                    err.to_reply(&ctx.server.name, session.nick_or_star(), &msg.command)
                {
                    session.send(reply);
                }
                Ok(())
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
