//! Nickname validation.

/// Maximum nickname length accepted by the server.
pub const NICK_MAX_LEN: usize = 9;

const SPECIAL: &[char] = &['-', '_', '[', ']', '{', '}', '\\', '|', '^'];

/// Extension trait for checking whether a string is a valid nickname.
///
/// Valid nicknames start with an ASCII letter, continue with letters,
/// digits, or one of `-_[]{}\|^`, and are at most [`NICK_MAX_LEN`] bytes.
pub trait NickExt {
    /// Check this string against the nickname grammar.
    ///
    /// # Examples
    ///
    /// ```
    /// use lark_proto::NickExt;
    ///
    /// assert!("alice".is_valid_nick());
    /// assert!("a[way]".is_valid_nick());
    /// assert!(!"9lives".is_valid_nick());
    /// assert!(!"much-too-long".is_valid_nick());
    /// ```
    fn is_valid_nick(&self) -> bool;
}

impl NickExt for str {
    fn is_valid_nick(&self) -> bool {
        if self.is_empty() || self.len() > NICK_MAX_LEN {
            return false;
        }
        let mut chars = self.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || SPECIAL.contains(&c))
    }
}

impl NickExt for String {
    fn is_valid_nick(&self) -> bool {
        self.as_str().is_valid_nick()
    }
}
