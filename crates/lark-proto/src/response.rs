//! IRC numeric reply codes.
//!
//! The static table of three-digit codes the server emits, each paired with
//! its default template text. The dispatcher treats this as an opaque
//! lookup; no protocol logic lives here.

#![allow(non_camel_case_types)]

/// A numeric reply code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Numeric {
    // === Connection registration (001-004) ===
    /// 001 - Welcome to the network
    RPL_WELCOME = 1,
    /// 002 - Your host is running version
    RPL_YOURHOST = 2,
    /// 003 - Server creation date
    RPL_CREATED = 3,
    /// 004 - Server info (name, version, user modes, channel modes)
    RPL_MYINFO = 4,

    // === Command replies (2xx-3xx) ===
    /// 324 - Channel mode string
    RPL_CHANNELMODEIS = 324,
    /// 331 - No topic is set
    RPL_NOTOPIC = 331,
    /// 332 - Channel topic
    RPL_TOPIC = 332,
    /// 341 - Invite confirmation to the inviter
    RPL_INVITING = 341,
    /// 353 - NAMES listing
    RPL_NAMREPLY = 353,
    /// 366 - End of NAMES listing
    RPL_ENDOFNAMES = 366,

    // === Error replies (4xx) ===
    /// 401 - No such nick/channel
    ERR_NOSUCHNICK = 401,
    /// 402 - No such server
    ERR_NOSUCHSERVER = 402,
    /// 403 - No such channel
    ERR_NOSUCHCHANNEL = 403,
    /// 404 - Cannot send to channel
    ERR_CANNOTSENDTOCHAN = 404,
    /// 405 - Too many channels
    ERR_TOOMANYCHANNELS = 405,
    /// 412 - No text to send
    ERR_NOTEXTTOSEND = 412,
    /// 421 - Unknown command
    ERR_UNKNOWNCOMMAND = 421,
    /// 431 - No nickname given
    ERR_NONICKNAMEGIVEN = 431,
    /// 432 - Erroneous nickname
    ERR_ERRONEUSNICKNAME = 432,
    /// 433 - Nickname is already in use
    ERR_NICKNAMEINUSE = 433,
    /// 441 - They aren't on that channel
    ERR_USERNOTINCHANNEL = 441,
    /// 442 - You're not on that channel
    ERR_NOTONCHANNEL = 442,
    /// 443 - Is already on channel
    ERR_USERONCHANNEL = 443,
    /// 461 - Not enough parameters
    ERR_NEEDMOREPARAMS = 461,
    /// 462 - You may not reregister
    ERR_ALREADYREGISTRED = 462,
    /// 464 - Password incorrect
    ERR_PASSWDMISMATCH = 464,
    /// 471 - Cannot join channel (+l)
    ERR_CHANNELISFULL = 471,
    /// 472 - Unknown mode character
    ERR_UNKNOWNMODE = 472,
    /// 473 - Cannot join channel (+i)
    ERR_INVITEONLYCHAN = 473,
    /// 475 - Cannot join channel (+k)
    ERR_BADCHANNELKEY = 475,
    /// 482 - You're not channel operator
    ERR_CHANOPRIVSNEEDED = 482,
}

impl Numeric {
    /// The three-digit code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Default template text for this code.
    ///
    /// Codes whose reply is fully dynamic (324, 332, 341, 353) have no
    /// fixed text and return an empty string.
    pub fn text(self) -> &'static str {
        match self {
            Self::RPL_WELCOME => "Welcome to the Internet Relay Network",
            Self::RPL_YOURHOST => "Your host is",
            Self::RPL_CREATED => "This server was created",
            Self::RPL_MYINFO => "",
            Self::RPL_CHANNELMODEIS => "",
            Self::RPL_NOTOPIC => "No topic is set",
            Self::RPL_TOPIC => "",
            Self::RPL_INVITING => "",
            Self::RPL_NAMREPLY => "",
            Self::RPL_ENDOFNAMES => "End of /NAMES list",
            Self::ERR_NOSUCHNICK => "No such nick/channel",
            Self::ERR_NOSUCHSERVER => "No such server",
            Self::ERR_NOSUCHCHANNEL => "No such channel",
            Self::ERR_CANNOTSENDTOCHAN => "Cannot send to channel",
            Self::ERR_TOOMANYCHANNELS => "You have joined too many channels",
            Self::ERR_NOTEXTTOSEND => "No text to send",
            Self::ERR_UNKNOWNCOMMAND => "Unknown command",
            Self::ERR_NONICKNAMEGIVEN => "No nickname given",
            Self::ERR_ERRONEUSNICKNAME => "Erroneous nickname",
            Self::ERR_NICKNAMEINUSE => "Nickname is already in use",
            Self::ERR_USERNOTINCHANNEL => "They aren't on that channel",
            Self::ERR_NOTONCHANNEL => "You're not on that channel",
            Self::ERR_USERONCHANNEL => "is already on channel",
            Self::ERR_NEEDMOREPARAMS => "Not enough parameters",
            Self::ERR_ALREADYREGISTRED => "You may not reregister",
            Self::ERR_PASSWDMISMATCH => "Password incorrect",
            Self::ERR_CHANNELISFULL => "Cannot join channel (+l)",
            Self::ERR_UNKNOWNMODE => "is unknown mode char to me",
            Self::ERR_INVITEONLYCHAN => "Cannot join channel (+i)",
            Self::ERR_BADCHANNELKEY => "Cannot join channel (+k)",
            Self::ERR_CHANOPRIVSNEEDED => "You're not channel operator",
        }
    }
}
