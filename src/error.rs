//! Unified error handling for larkd.
//!
//! Two tiers, mirroring the protocol's error taxonomy: `HandlerError` for
//! per-command failures (converted to a numeric reply by the dispatcher)
//! and `ChannelError` for channel admission failures (converted per target
//! inside multi-target handlers). Transport failures never appear here;
//! they are reported to the control loop as connection-close events.

use lark_proto::Numeric;
use thiserror::Error;

use crate::handlers::helpers::numeric_line;

/// Errors that can occur during command handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("not enough parameters")]
    NeedMoreParams,

    #[error("no text to send")]
    NoTextToSend,

    #[error("no nickname given")]
    NoNicknameGiven,

    #[error("erroneous nickname: {0}")]
    ErroneousNickname(String),

    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    #[error("already registered")]
    AlreadyRegistered,

    #[error("password incorrect")]
    PasswdMismatch,

    #[error("password required before USER")]
    PassRequired,

    #[error("no such nick: {0}")]
    NoSuchNick(String),

    #[error("no such channel: {0}")]
    NoSuchChannel(String),

    #[error("not on channel: {0}")]
    NotOnChannel(String),

    #[error("cannot send to channel: {0}")]
    CannotSendToChan(String),

    #[error("channel operator privileges needed on {0}")]
    ChanOpPrivsNeeded(String),

    #[error("user {nick} is not on channel {channel}")]
    UserNotInChannel { nick: String, channel: String },

    #[error("user {nick} is already on channel {channel}")]
    UserOnChannel { nick: String, channel: String },

    /// The session vanished mid-dispatch; no reply possible.
    #[error("session gone")]
    SessionGone,

    /// The client asked to quit; the control loop tears the session down.
    #[error("client quit: {0:?}")]
    Quit(Option<String>),
}

impl HandlerError {
    /// Convert to a numeric reply line.
    ///
    /// Returns `None` for errors that don't warrant a client-visible reply
    /// (quit, vanished session).
    pub fn to_reply(&self, server: &str, nick: &str, cmd: &str) -> Option<String> {
        let (num, tail) = match self {
            Self::NeedMoreParams => (
                Numeric::ERR_NEEDMOREPARAMS,
                format!("{} :{}", cmd, Numeric::ERR_NEEDMOREPARAMS.text()),
            ),
            Self::NoTextToSend => (
                Numeric::ERR_NOTEXTTOSEND,
                format!(":{}", Numeric::ERR_NOTEXTTOSEND.text()),
            ),
            Self::NoNicknameGiven => (
                Numeric::ERR_NONICKNAMEGIVEN,
                format!(":{}", Numeric::ERR_NONICKNAMEGIVEN.text()),
            ),
            Self::ErroneousNickname(bad) => (
                Numeric::ERR_ERRONEUSNICKNAME,
                format!("{} :{}", bad, Numeric::ERR_ERRONEUSNICKNAME.text()),
            ),
            Self::NicknameInUse(bad) => (
                Numeric::ERR_NICKNAMEINUSE,
                format!("{} :{}", bad, Numeric::ERR_NICKNAMEINUSE.text()),
            ),
            Self::AlreadyRegistered => (
                Numeric::ERR_ALREADYREGISTRED,
                format!(":{}", Numeric::ERR_ALREADYREGISTRED.text()),
            ),
            Self::PasswdMismatch => (
                Numeric::ERR_PASSWDMISMATCH,
                format!(":{}", Numeric::ERR_PASSWDMISMATCH.text()),
            ),
            Self::PassRequired => (
                Numeric::ERR_PASSWDMISMATCH,
                ":You must send PASS first".to_string(),
            ),
            Self::NoSuchNick(target) => (
                Numeric::ERR_NOSUCHNICK,
                format!("{} :{}", target, Numeric::ERR_NOSUCHNICK.text()),
            ),
            Self::NoSuchChannel(channel) => (
                Numeric::ERR_NOSUCHCHANNEL,
                format!("{} :{}", channel, Numeric::ERR_NOSUCHCHANNEL.text()),
            ),
            Self::NotOnChannel(channel) => (
                Numeric::ERR_NOTONCHANNEL,
                format!("{} :{}", channel, Numeric::ERR_NOTONCHANNEL.text()),
            ),
            Self::CannotSendToChan(channel) => (
                Numeric::ERR_CANNOTSENDTOCHAN,
                format!("{} :{}", channel, Numeric::ERR_CANNOTSENDTOCHAN.text()),
            ),
            Self::ChanOpPrivsNeeded(channel) => (
                Numeric::ERR_CHANOPRIVSNEEDED,
                format!("{} :{}", channel, Numeric::ERR_CHANOPRIVSNEEDED.text()),
            ),
            Self::UserNotInChannel { nick: n, channel } => (
                Numeric::ERR_USERNOTINCHANNEL,
                format!("{} {} :{}", n, channel, Numeric::ERR_USERNOTINCHANNEL.text()),
            ),
            Self::UserOnChannel { nick: n, channel } => (
                Numeric::ERR_USERONCHANNEL,
                format!("{} {} :{}", n, channel, Numeric::ERR_USERONCHANNEL.text()),
            ),
            Self::SessionGone | Self::Quit(_) => return None,
        };
        Some(numeric_line(server, num, nick, &tail))
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Channel admission failures, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("cannot join channel (+k)")]
    BadChannelKey,

    #[error("cannot join channel (+l)")]
    ChannelIsFull,

    #[error("cannot join channel (+i)")]
    InviteOnlyChan,
}

impl ChannelError {
    /// Convert to a numeric reply line for the given channel.
    pub fn to_reply(&self, server: &str, nick: &str, channel: &str) -> String {
        let num = match self {
            Self::BadChannelKey => Numeric::ERR_BADCHANNELKEY,
            Self::ChannelIsFull => Numeric::ERR_CHANNELISFULL,
            Self::InviteOnlyChan => Numeric::ERR_INVITEONLYCHAN,
        };
        numeric_line(server, num, nick, &format!("{} :{}", channel, num.text()))
    }
}
