//! Text formatting for derived messages.
//!
//! Operation summaries arrive as plain text with entity names in double
//! quotes (`Created tile "Roadmap"`). Rendering replaces each quoted name with
//! a bold label, and for operations whose target still exists, with a
//! navigation link the UI turns into a click target.

use crate::types::{NavigationPayload, OperationCompletedPayload, OperationKind};

/// Names longer than this many characters are truncated.
pub const MAX_NAME_CHARS: usize = 25;

/// Appended to truncated names.
pub const ELLIPSIS: &str = "...";

/// Link scheme the UI interprets as "centre the map on this tile".
pub const NAVIGATE_COMMAND: &str = "command:navigate:";

/// Shorten `name` to [`MAX_NAME_CHARS`] characters plus [`ELLIPSIS`].
pub fn truncate_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_CHARS {
        return name.to_string();
    }
    let mut short: String = name.chars().take(MAX_NAME_CHARS).collect();
    short.push_str(ELLIPSIS);
    short
}

/// `**label**`
pub fn bold(label: &str) -> String {
    format!("**{label}**")
}

/// `[**label**](command:navigate:target)`
pub fn navigate_link(label: &str, target: &str) -> String {
    format!("[**{label}**]({NAVIGATE_COMMAND}{target})")
}

/// Replace up to `limit` quoted names in `message` with `render(name)`.
///
/// Names are truncated before rendering. The quotes themselves are dropped.
/// An unterminated quote ends the scan and the rest is kept verbatim.
pub fn rewrite_quoted<F>(message: &str, limit: usize, mut render: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(message.len() + 32);
    let mut rest = message;
    let mut replaced = 0;

    while replaced < limit {
        let Some(open) = rest.find('"') else { break };
        let after_open = &rest[open + 1..];
        let Some(len) = after_open.find('"') else { break };

        out.push_str(&rest[..open]);
        out.push_str(&render(&truncate_name(&after_open[..len])));
        rest = &after_open[len + 1..];
        replaced += 1;
    }

    out.push_str(rest);
    out
}

/// Render an `operation_completed` summary.
///
/// Create, edit and move link the first quoted name to the affected tile
/// (falling back to its coordinate, then to bold text). Delete bolds the
/// name since its target is gone; swap bolds both names. Other operations
/// pass through unchanged.
pub fn operation_message(payload: &OperationCompletedPayload) -> String {
    let message = payload.message.as_str();
    match payload.operation {
        OperationKind::Create | OperationKind::Edit | OperationKind::Move => {
            match payload.tile_id.as_deref().or(payload.coord_id.as_deref()) {
                Some(target) => rewrite_quoted(message, 1, |name| navigate_link(name, target)),
                None => rewrite_quoted(message, 1, bold),
            }
        }
        OperationKind::Delete => rewrite_quoted(message, 1, bold),
        OperationKind::Swap => rewrite_quoted(message, 2, bold),
        OperationKind::Other(_) => message.to_string(),
    }
}

/// Render a `navigation` event: `Navigated [from X] to [**Y**](...)`.
pub fn navigation_message(payload: &NavigationPayload) -> String {
    let to = navigate_link(
        &truncate_name(&payload.to_center_name),
        &payload.to_center_id,
    );
    match payload.from_center_name.as_deref().filter(|n| !n.is_empty()) {
        Some(from) => format!("Navigated from {} to {to}", truncate_name(from)),
        None => format!("Navigated to {to}"),
    }
}
