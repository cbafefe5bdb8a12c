//! MODE: query and mutate channel modes.

use std::fmt;

use lark_proto::{Message, Numeric};
use tracing::debug;

use super::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::state::ModeChange;

/// Accumulator for the outgoing MODE broadcast.
///
/// Collects only the changes that were actually applied, collapsing
/// consecutive same-sign letters, so `+i+t-k` goes out as `+it-k` and a
/// skipped letter (missing parameter, refused change) never appears.
#[derive(Debug, Default)]
struct AppliedModes {
    letters: String,
    params: Vec<String>,
    last_sign: Option<char>,
}

impl AppliedModes {
    fn push(&mut self, adding: bool, letter: char, param: Option<&str>) {
        let sign = if adding { '+' } else { '-' };
        if self.last_sign != Some(sign) {
            self.letters.push(sign);
            self.last_sign = Some(sign);
        }
        self.letters.push(letter);
        if let Some(param) = param {
            self.params.push(param.to_string());
        }
    }

    fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

impl fmt::Display for AppliedModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters)?;
        for param in &self.params {
            write!(f, " {}", param)?;
        }
        Ok(())
    }
}

/// MODE handler.
pub struct ModeHandler;

impl Handler for ModeHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let name = msg.arg(0).ok_or(HandlerError::NeedMoreParams)?.to_string();

        let (flags, is_op) = {
            let Some(chan) = ctx.state.channel(&name) else {
                return Err(HandlerError::NoSuchChannel(name));
            };
            (chan.modes().flags(), chan.is_operator(ctx.id))
        };

        let Some(mode_str) = msg.arg(1) else {
            ctx.reply(
                Numeric::RPL_CHANNELMODEIS,
                &format!("{} +{}", name, flags),
            );
            return Ok(());
        };
        if !is_op {
            return Err(HandlerError::ChanOpPrivsNeeded(name));
        }

        let mut applied = AppliedModes::default();
        let mut adding = true;
        let mut param_idx = 2usize;

        // Each letter applies or fails on its own; a bad one never aborts
        // the rest of the string.
        for letter in mode_str.chars() {
            match letter {
                '+' => adding = true,
                '-' => adding = false,
                'i' => {
                    if apply(ctx, &name, ModeChange::InviteOnly(adding)) {
                        applied.push(adding, 'i', None);
                    }
                }
                't' => {
                    if apply(ctx, &name, ModeChange::TopicProtected(adding)) {
                        applied.push(adding, 't', None);
                    }
                }
                'k' => {
                    if adding {
                        // No parameter (or an empty one): nothing to apply.
                        let Some(key) = next_param(msg, &mut param_idx).filter(|k| !k.is_empty())
                        else {
                            continue;
                        };
                        if apply(ctx, &name, ModeChange::Key(Some(key.to_string()))) {
                            applied.push(true, 'k', Some(key));
                        }
                    } else if apply(ctx, &name, ModeChange::Key(None)) {
                        applied.push(false, 'k', None);
                    }
                }
                'l' => {
                    if adding {
                        let Some(raw) = next_param(msg, &mut param_idx) else {
                            continue;
                        };
                        // Non-numeric parses to zero: no limit enforced,
                        // and nothing worth echoing.
                        let limit = raw.parse::<u32>().unwrap_or(0);
                        if limit > 0
                            && apply(ctx, &name, ModeChange::Limit(Some(limit)))
                        {
                            applied.push(true, 'l', Some(raw));
                        } else if limit == 0 {
                            apply(ctx, &name, ModeChange::Limit(None));
                        }
                    } else if apply(ctx, &name, ModeChange::Limit(None)) {
                        applied.push(false, 'l', None);
                    }
                }
                'o' => {
                    // Consumes its parameter in both directions.
                    let Some(target_nick) = next_param(msg, &mut param_idx) else {
                        continue;
                    };
                    let Some(target) = ctx.state.find_nick(target_nick) else {
                        ctx.reply(
                            Numeric::ERR_NOSUCHNICK,
                            &format!("{} :{}", target_nick, Numeric::ERR_NOSUCHNICK.text()),
                        );
                        continue;
                    };
                    let is_member = ctx
                        .state
                        .channel(&name)
                        .is_some_and(|c| c.is_member(target));
                    if !is_member {
                        ctx.reply(
                            Numeric::ERR_USERNOTINCHANNEL,
                            &format!(
                                "{} {} :{}",
                                target_nick,
                                name,
                                Numeric::ERR_USERNOTINCHANNEL.text()
                            ),
                        );
                        continue;
                    }
                    if let Some(chan) = ctx.state.channel_mut(&name) {
                        if adding {
                            chan.grant_operator(target);
                        } else {
                            chan.revoke_operator(target);
                        }
                    }
                    applied.push(adding, 'o', Some(target_nick));
                }
                other => {
                    ctx.reply(
                        Numeric::ERR_UNKNOWNMODE,
                        &format!("{} :{}", other, Numeric::ERR_UNKNOWNMODE.text()),
                    );
                }
            }
        }

        if !applied.is_empty() {
            let prefix = ctx.session()?.prefix();
            let line = format!(":{} MODE {} {}", prefix, name, applied);
            ctx.state.broadcast_to_channel(&name, &line, None);
            debug!(channel = %name, modes = %applied, "modes changed");
        }
        Ok(())
    }
}

fn next_param<'m>(msg: &'m Message, idx: &mut usize) -> Option<&'m str> {
    let param = msg.arg(*idx)?;
    *idx += 1;
    Some(param)
}

/// Apply one change as the dispatching session. Returns whether the channel
/// accepted it (it refuses when the caller lost operator status mid-string).
fn apply(ctx: &mut Context<'_>, name: &str, change: ModeChange) -> bool {
    let id = ctx.id;
    ctx.state
        .channel_mut(name)
        .is_some_and(|chan| chan.apply_mode(Some(id), change))
}
