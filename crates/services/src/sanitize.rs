//! Markup sanitation.
//!
//! Raw post text may carry arbitrary HTML. Every topic rule and the
//! mova-pic caption path judge the *plain text* a user typed, so we strip
//! all tags and attributes with an empty allow-list and then decode the
//! entity escaping ammonia leaves behind.

use std::borrow::Cow;

/// Reduces raw (possibly marked-up) text to plain text.
pub fn sanitize(raw: &str) -> String {
    let stripped = ammonia::Builder::default()
        .tags(std::collections::HashSet::new())
        .generic_attributes(std::collections::HashSet::new())
        .clean(raw)
        .to_string();
    match html_escape::decode_html_entities(&stripped) {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}
