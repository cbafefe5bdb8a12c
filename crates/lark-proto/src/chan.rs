//! Channel name validation.

/// Maximum channel name length accepted by the server.
pub const CHANNEL_MAX_LEN: usize = 50;

/// Extension trait for checking whether a string names a channel.
///
/// Channel names start with `#` or `&`, are at most [`CHANNEL_MAX_LEN`]
/// bytes, and contain no space, comma, or BEL.
pub trait ChannelNameExt {
    /// Check this string against the channel name grammar.
    ///
    /// # Examples
    ///
    /// ```
    /// use lark_proto::ChannelNameExt;
    ///
    /// assert!("#lark".is_channel_name());
    /// assert!("&local".is_channel_name());
    /// assert!(!"lark".is_channel_name());
    /// assert!(!"#a,b".is_channel_name());
    /// ```
    fn is_channel_name(&self) -> bool;
}

impl ChannelNameExt for str {
    fn is_channel_name(&self) -> bool {
        if self.len() < 2 || self.len() > CHANNEL_MAX_LEN {
            return false;
        }
        if !self.starts_with(['#', '&']) {
            return false;
        }
        !self[1..].contains([' ', ',', '\x07'])
    }
}

impl ChannelNameExt for String {
    fn is_channel_name(&self) -> bool {
        self.as_str().is_channel_name()
    }
}
