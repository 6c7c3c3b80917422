//! Console text filtering for lines printed by the host or a loaded module.

use tracing::info;

const SKIP_NOTIFY_PREFIX: &str = "[skipnotify]";
const COLOR_ESCAPE: char = '^';

/// Removes `^N` colour escapes and any character outside printable ASCII.
pub fn clean_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == COLOR_ESCAPE && chars.peek().is_some_and(|next| next.is_ascii_digit()) {
            chars.next();
            continue;
        }
        if (' '..='~').contains(&c) {
            out.push(c);
        }
    }

    out
}

/// Drops the `[skipnotify]` marker and then a single leading `*`.
pub fn strip_print_prefixes(msg: &str) -> &str {
    let msg = msg.strip_prefix(SKIP_NOTIFY_PREFIX).unwrap_or(msg);
    msg.strip_prefix('*').unwrap_or(msg)
}

/// Filters a console line and forwards it to the log. Returns the text that was
/// emitted.
pub fn print(msg: &str) -> String {
    let line = clean_str(strip_print_prefixes(msg));
    info!(target: "console", "{line}");
    line
}
