//! Connection and registration handlers: PASS, NICK, USER, PING, QUIT.

use std::collections::BTreeSet;

use lark_proto::{Message, NickExt, Numeric};
use tracing::{debug, info, trace};

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};

/// PASS: present the shared connection password.
pub struct PassHandler;

impl Handler for PassHandler {
    fn needs_registration(&self) -> bool {
        false
    }

    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        if ctx.session()?.registered {
            return Err(HandlerError::AlreadyRegistered);
        }
        let supplied = msg.arg(0).ok_or(HandlerError::NeedMoreParams)?;
        if supplied != ctx.server.password {
            debug!(id = %ctx.id, "wrong password");
            return Err(HandlerError::PasswdMismatch);
        }
        let session = ctx.session_mut()?;
        if session.password_given {
            trace!(id = %session.id(), "PASS resent after acceptance");
            return Ok(());
        }
        session.password_given = true;
        debug!(id = %session.id(), "password accepted");
        Ok(())
    }
}

/// NICK: pick or change a nickname.
pub struct NickHandler;

impl Handler for NickHandler {
    fn needs_registration(&self) -> bool {
        false
    }

    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let nick = msg.arg(0).ok_or(HandlerError::NoNicknameGiven)?;
        if !nick.is_valid_nick() {
            return Err(HandlerError::ErroneousNickname(nick.to_string()));
        }
        if let Some(holder) = ctx.state.find_nick(nick) {
            if holder != ctx.id {
                return Err(HandlerError::NicknameInUse(nick.to_string()));
            }
        }

        // A live rename is announced to every channel the session is in;
        // co-members sharing several channels still see it once.
        let session = ctx.session()?;
        if session.registered {
            let line = format!(":{} NICK :{}", session.prefix(), nick);
            let mut recipients: BTreeSet<_> = BTreeSet::new();
            for name in session.channels() {
                if let Some(chan) = ctx.state.channel(name) {
                    recipients.extend(chan.members().iter().copied());
                }
            }
            for id in recipients {
                ctx.state.send_to(id, &line);
            }
            info!(old = %session.nick_or_star(), new = %nick, "nick changed");
        }

        ctx.session_mut()?.nick = Some(nick.to_string());
        try_register(ctx)
    }
}

/// USER: supply username and realname.
pub struct UserHandler;

impl Handler for UserHandler {
    fn needs_registration(&self) -> bool {
        false
    }

    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        if ctx.session()?.registered {
            return Err(HandlerError::AlreadyRegistered);
        }
        // USER <username> <mode> <unused> <realname>
        if msg.params.len() < 4 {
            return Err(HandlerError::NeedMoreParams);
        }
        if !ctx.session()?.password_given {
            return Err(HandlerError::PassRequired);
        }
        let username = msg.params[0].clone();
        let realname = msg.params[3].clone();
        let session = ctx.session_mut()?;
        session.username = Some(username);
        session.realname = realname;
        try_register(ctx)
    }
}

/// Complete registration and send the welcome burst once PASS, NICK, and
/// USER have all succeeded.
fn try_register(ctx: &mut Context<'_>) -> HandlerResult {
    if !ctx.session()?.can_register() {
        return Ok(());
    }
    ctx.session_mut()?.registered = true;

    let session = ctx.session()?;
    let prefix = session.prefix();
    info!(id = %session.id(), nick = %session.nick_or_star(), "registration complete");

    let server = ctx.server;
    ctx.reply(
        Numeric::RPL_WELCOME,
        &format!(":{} {}", Numeric::RPL_WELCOME.text(), prefix),
    );
    ctx.reply(
        Numeric::RPL_YOURHOST,
        &format!(
            ":{} {}, running version {}",
            Numeric::RPL_YOURHOST.text(),
            server.name,
            server.version
        ),
    );
    ctx.reply(
        Numeric::RPL_CREATED,
        &format!(":{} {}", Numeric::RPL_CREATED.text(), server.created),
    );
    ctx.reply(
        Numeric::RPL_MYINFO,
        &format!("{} {} o itkol", server.name, server.version),
    );
    Ok(())
}

/// PING: liveness probe, answered with PONG.
pub struct PingHandler;

impl Handler for PingHandler {
    fn needs_registration(&self) -> bool {
        false
    }

    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let token = msg.arg(0).ok_or(HandlerError::NeedMoreParams)?;
        let line = format!(":{0} PONG {0} :{1}", ctx.server.name, token);
        ctx.session()?.send(line);
        Ok(())
    }
}

/// QUIT: the control loop tears the session down with the given reason.
pub struct QuitHandler;

impl Handler for QuitHandler {
    fn needs_registration(&self) -> bool {
        false
    }

    fn handle(&self, _ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        Err(HandlerError::Quit(msg.arg(0).map(str::to_string)))
    }
}
