//! Shared reply construction.

use lark_proto::Numeric;

/// Format a numeric reply line: `:<server> <code> <target> <tail>`.
///
/// `target` is the session's nickname, or `*` before one is set. The tail
/// is everything after the target, already formatted by the caller from the
/// numeric's template text.
pub fn numeric_line(server: &str, num: Numeric, target: &str, tail: &str) -> String {
    format!(":{} {:03} {} {}", server, num.code(), target, tail)
}
