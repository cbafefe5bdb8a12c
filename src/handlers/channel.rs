//! Channel membership handlers: JOIN, PART, NAMES, TOPIC, INVITE, KICK.

use lark_proto::{ChannelNameExt, Message, Numeric};
use tracing::{debug, info};

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};

/// Send the NAMES listing for a channel: one 353 with operators prefixed
/// `@`, then 366. Used after JOIN and by NAMES itself.
fn send_names(ctx: &Context<'_>, name: &str) {
    let mut names = String::new();
    if let Some(chan) = ctx.state.channel(name) {
        for &member in chan.members() {
            let Some(session) = ctx.state.session(member) else {
                continue;
            };
            if !names.is_empty() {
                names.push(' ');
            }
            if chan.is_operator(member) {
                names.push('@');
            }
            names.push_str(session.nick_or_star());
        }
    }
    ctx.reply(Numeric::RPL_NAMREPLY, &format!("= {} :{}", name, names));
    ctx.reply(
        Numeric::RPL_ENDOFNAMES,
        &format!("{} :{}", name, Numeric::RPL_ENDOFNAMES.text()),
    );
}

/// JOIN: enter one or more channels, creating them on first use.
pub struct JoinHandler;

impl Handler for JoinHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let list = msg.arg(0).ok_or(HandlerError::NeedMoreParams)?;
        let keys: Vec<&str> = msg
            .arg(1)
            .map(|k| k.split(',').collect())
            .unwrap_or_default();

        // Each channel in the list succeeds or fails on its own.
        for (i, name) in list.split(',').enumerate() {
            let key = keys.get(i).copied().unwrap_or("");

            if !name.is_channel_name() {
                ctx.reply(
                    Numeric::ERR_NOSUCHCHANNEL,
                    &format!("{} :{}", name, Numeric::ERR_NOSUCHCHANNEL.text()),
                );
                continue;
            }

            let id = ctx.id;
            let created = !ctx.state.has_channel(name);
            if let Err(err) = ctx.state.create_channel(name).join(id, key) {
                // A channel created just for this join must not outlive
                // the failed admission with zero members.
                if created {
                    ctx.state.remove_channel(name);
                }
                let session = ctx.session()?;
                session.send(err.to_reply(&ctx.server.name, session.nick_or_star(), name));
                continue;
            }
            if created {
                if let Some(chan) = ctx.state.channel_mut(name) {
                    chan.grant_operator(id);
                }
                info!(channel = %name, "channel created");
            }
            ctx.session_mut()?.join_channel(name);

            let prefix = ctx.session()?.prefix();
            ctx.state
                .broadcast_to_channel(name, &format!(":{} JOIN {}", prefix, name), None);

            let topic = ctx
                .state
                .channel(name)
                .map(|c| c.topic().to_string())
                .unwrap_or_default();
            if topic.is_empty() {
                ctx.reply(
                    Numeric::RPL_NOTOPIC,
                    &format!("{} :{}", name, Numeric::RPL_NOTOPIC.text()),
                );
            } else {
                ctx.reply(Numeric::RPL_TOPIC, &format!("{} :{}", name, topic));
            }
            send_names(ctx, name);
        }
        Ok(())
    }
}

/// PART: leave one or more channels.
pub struct PartHandler;

impl Handler for PartHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let list = msg.arg(0).ok_or(HandlerError::NeedMoreParams)?;
        let reason = msg.arg(1).unwrap_or("Leaving");

        for name in list.split(',') {
            let id = ctx.id;
            let Some(chan) = ctx.state.channel(name) else {
                ctx.reply(
                    Numeric::ERR_NOSUCHCHANNEL,
                    &format!("{} :{}", name, Numeric::ERR_NOSUCHCHANNEL.text()),
                );
                continue;
            };
            if !chan.is_member(id) {
                ctx.reply(
                    Numeric::ERR_NOTONCHANNEL,
                    &format!("{} :{}", name, Numeric::ERR_NOTONCHANNEL.text()),
                );
                continue;
            }

            // The leaver sees its own PART, so broadcast before removal.
            let prefix = ctx.session()?.prefix();
            ctx.state.broadcast_to_channel(
                name,
                &format!(":{} PART {} :{}", prefix, name, reason),
                None,
            );

            let empty = match ctx.state.channel_mut(name) {
                Some(chan) => {
                    chan.remove_member(id);
                    chan.is_empty()
                }
                None => false,
            };
            ctx.session_mut()?.leave_channel(name);
            if empty {
                ctx.state.remove_channel(name);
            }
        }
        Ok(())
    }
}

/// NAMES: list channel members.
pub struct NamesHandler;

impl Handler for NamesHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let Some(name) = msg.arg(0) else {
            ctx.reply(
                Numeric::RPL_ENDOFNAMES,
                &format!("* :{}", Numeric::RPL_ENDOFNAMES.text()),
            );
            return Ok(());
        };
        if !ctx.state.has_channel(name) {
            return Err(HandlerError::NoSuchChannel(name.to_string()));
        }
        send_names(ctx, name);
        Ok(())
    }
}

/// TOPIC: query or set a channel topic.
pub struct TopicHandler;

impl Handler for TopicHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let name = msg.arg(0).ok_or(HandlerError::NeedMoreParams)?;
        let Some(chan) = ctx.state.channel(name) else {
            return Err(HandlerError::NoSuchChannel(name.to_string()));
        };
        if !chan.is_member(ctx.id) {
            return Err(HandlerError::NotOnChannel(name.to_string()));
        }

        let Some(text) = msg.arg(1) else {
            let topic = chan.topic().to_string();
            if topic.is_empty() {
                ctx.reply(
                    Numeric::RPL_NOTOPIC,
                    &format!("{} :{}", name, Numeric::RPL_NOTOPIC.text()),
                );
            } else {
                ctx.reply(Numeric::RPL_TOPIC, &format!("{} :{}", name, topic));
            }
            return Ok(());
        };

        if chan.modes().topic_protected && !chan.is_operator(ctx.id) {
            return Err(HandlerError::ChanOpPrivsNeeded(name.to_string()));
        }
        let id = ctx.id;
        if let Some(chan) = ctx.state.channel_mut(name) {
            chan.set_topic(Some(id), text);
        }
        let prefix = ctx.session()?.prefix();
        ctx.state.broadcast_to_channel(
            name,
            &format!(":{} TOPIC {} :{}", prefix, name, text),
            None,
        );
        debug!(channel = %name, "topic changed");
        Ok(())
    }
}

/// INVITE: invite a user to a channel.
pub struct InviteHandler;

impl Handler for InviteHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        if msg.params.len() < 2 {
            return Err(HandlerError::NeedMoreParams);
        }
        let target_nick = &msg.params[0];
        let name = &msg.params[1];

        let Some(chan) = ctx.state.channel(name) else {
            return Err(HandlerError::NoSuchChannel(name.to_string()));
        };
        if !chan.is_member(ctx.id) {
            return Err(HandlerError::NotOnChannel(name.to_string()));
        }
        if chan.modes().invite_only && !chan.is_operator(ctx.id) {
            return Err(HandlerError::ChanOpPrivsNeeded(name.to_string()));
        }
        let Some(target) = ctx.state.find_nick(target_nick) else {
            return Err(HandlerError::NoSuchNick(target_nick.to_string()));
        };
        if chan.is_member(target) {
            return Err(HandlerError::UserOnChannel {
                nick: target_nick.to_string(),
                channel: name.to_string(),
            });
        }

        let id = ctx.id;
        if let Some(chan) = ctx.state.channel_mut(name) {
            chan.invite(id, target);
        }
        ctx.reply(Numeric::RPL_INVITING, &format!("{} {}", target_nick, name));
        let prefix = ctx.session()?.prefix();
        ctx.state
            .send_to(target, &format!(":{} INVITE {} {}", prefix, target_nick, name));
        debug!(channel = %name, target = %target_nick, "invite recorded");
        Ok(())
    }
}

/// KICK: eject a member from a channel.
pub struct KickHandler;

impl Handler for KickHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        if msg.params.len() < 2 {
            return Err(HandlerError::NeedMoreParams);
        }
        let name = &msg.params[0];
        let target_nick = &msg.params[1];
        let reason = msg.arg(2).unwrap_or("Kicked");

        let Some(chan) = ctx.state.channel(name) else {
            return Err(HandlerError::NoSuchChannel(name.to_string()));
        };
        if !chan.is_operator(ctx.id) {
            return Err(HandlerError::ChanOpPrivsNeeded(name.to_string()));
        }
        let Some(target) = ctx.state.find_nick(target_nick) else {
            return Err(HandlerError::NoSuchNick(target_nick.to_string()));
        };
        if !chan.is_member(target) {
            return Err(HandlerError::UserNotInChannel {
                nick: target_nick.to_string(),
                channel: name.to_string(),
            });
        }

        // The target sees its own KICK, so broadcast before removal.
        let prefix = ctx.session()?.prefix();
        ctx.state.broadcast_to_channel(
            name,
            &format!(":{} KICK {} {} :{}", prefix, name, target_nick, reason),
            None,
        );

        let id = ctx.id;
        if let Some(chan) = ctx.state.channel_mut(name) {
            chan.kick(id, target);
        }
        if let Some(target_session) = ctx.state.session_mut(target) {
            target_session.leave_channel(name);
        }
        info!(channel = %name, target = %target_nick, "member kicked");
        Ok(())
    }
}
