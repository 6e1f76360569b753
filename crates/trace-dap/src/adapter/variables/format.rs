//! Bounded value formatting.
//! - format_value: display string, truncated, never failing

use tracing::debug;

use crate::value::Value;

/// Shown in place of a value that cannot be rendered.
pub(in crate::adapter) const UNRENDERABLE: &str = "<error: value cannot be displayed>";

const ELLIPSIS: &str = "...";

pub(in crate::adapter) fn format_value(value: &Value, max_len: usize) -> String {
    match value.render() {
        Ok(text) => truncate_chars(text, max_len),
        Err(err) => {
            debug!(%err, "render failed");
            UNRENDERABLE.to_string()
        }
    }
}

fn truncate_chars(mut text: String, max_len: usize) -> String {
    if let Some((cut, _)) = text.char_indices().nth(max_len) {
        text.truncate(cut);
        text.push_str(ELLIPSIS);
    }
    text
}
