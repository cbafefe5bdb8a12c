//! The owned IRC message model.
//!
//! A message is one wire line: an optional `:prefix`, a verb, and positional
//! parameters, where a parameter introduced by `:` swallows the rest of the
//! line verbatim (embedded spaces included).

use std::fmt;

use crate::error::MessageParseError;

/// A parsed IRC line.
///
/// # Example
///
/// ```
/// use lark_proto::Message;
///
/// let msg = Message::parse("PRIVMSG #lark :hello there").unwrap();
/// assert_eq!(msg.command, "PRIVMSG");
/// assert_eq!(msg.params, vec!["#lark", "hello there"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message source (`nick!user@host` or a server name), without the colon.
    pub prefix: Option<String>,
    /// The verb, upper-cased during parsing.
    pub command: String,
    /// Positional parameters; the trailing parameter, if any, is last.
    pub params: Vec<String>,
}

impl Message {
    /// Build a message from a verb and parameters.
    pub fn new(command: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.into(),
            params,
        }
    }

    /// Attach a source prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Get parameter `n` as a string slice.
    pub fn arg(&self, n: usize) -> Option<&str> {
        self.params.get(n).map(String::as_str)
    }

    /// Parse one line.
    ///
    /// Tokens are separated by runs of spaces; the verb is upper-cased; a
    /// token starting with `:` begins the trailing parameter, which keeps
    /// the remainder of the line exactly as received. Line terminators are
    /// tolerated and stripped. A blank line yields [`MessageParseError::Empty`].
    pub fn parse(input: &str) -> Result<Self, MessageParseError> {
        let mut rest = input.trim_end_matches(['\r', '\n']).trim_start_matches(' ');

        let prefix = match rest.strip_prefix(':') {
            Some(after) => match after.split_once(' ') {
                Some((p, tail)) => {
                    rest = tail.trim_start_matches(' ');
                    Some(p.to_string())
                }
                // A prefix with no verb after it is as empty as a blank line.
                None => return Err(MessageParseError::Empty),
            },
            None => None,
        };

        let (verb, mut rest) = match rest.split_once(' ') {
            Some((v, tail)) => (v, tail),
            None => (rest, ""),
        };
        if verb.is_empty() {
            return Err(MessageParseError::Empty);
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((tok, tail)) => {
                    params.push(tok.to_string());
                    rest = tail;
                }
                None => {
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Ok(Self {
            prefix,
            command: verb.to_ascii_uppercase(),
            params,
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        f.write_str(&self.command)?;
        if let Some((last, init)) = self.params.split_last() {
            for param in init {
                write!(f, " {}", param)?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{}", last)?;
            } else {
                write!(f, " {}", last)?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Message {
    type Err = MessageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
