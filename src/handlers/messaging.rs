//! Message relay handlers: PRIVMSG and NOTICE.
//!
//! The two verbs share one relay routine; NOTICE differs only in never
//! sending error numerics back to the sender.

use lark_proto::Message;
use tracing::trace;

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};

fn relay(ctx: &mut Context<'_>, msg: &Message, verb: &str, errors: bool) -> HandlerResult {
    fn silent_or(errors: bool, err: HandlerError) -> HandlerResult {
        if errors { Err(err) } else { Ok(()) }
    }

    let Some(target) = msg.arg(0) else {
        return silent_or(errors, HandlerError::NeedMoreParams);
    };
    let Some(text) = msg.arg(1) else {
        return silent_or(errors, HandlerError::NoTextToSend);
    };
    if text.is_empty() {
        return silent_or(errors, HandlerError::NoTextToSend);
    }

    if target.starts_with(['#', '&']) {
        let Some(chan) = ctx.state.channel(target) else {
            return silent_or(errors, HandlerError::NoSuchChannel(target.to_string()));
        };
        if !chan.is_member(ctx.id) {
            return silent_or(errors, HandlerError::CannotSendToChan(target.to_string()));
        }
        let prefix = ctx.session()?.prefix();
        trace!(channel = %target, %verb, "relaying to channel");
        ctx.state.broadcast_to_channel(
            target,
            &format!(":{} {} {} :{}", prefix, verb, target, text),
            Some(ctx.id),
        );
    } else {
        let Some(peer) = ctx.state.find_nick(target) else {
            return silent_or(errors, HandlerError::NoSuchNick(target.to_string()));
        };
        let prefix = ctx.session()?.prefix();
        trace!(nick = %target, %verb, "relaying to user");
        ctx.state
            .send_to(peer, &format!(":{} {} {} :{}", prefix, verb, target, text));
    }
    Ok(())
}

/// PRIVMSG: deliver a message to a channel or a user.
pub struct PrivmsgHandler;

impl Handler for PrivmsgHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        relay(ctx, msg, "PRIVMSG", true)
    }
}

/// NOTICE: like PRIVMSG, but failures are silent.
pub struct NoticeHandler;

impl Handler for NoticeHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        relay(ctx, msg, "NOTICE", false)
    }
}
