//! Message personalization placeholders.
//!
//! Messages may contain `{{firstName}}`, `{{lastName}}`, `{{company}}` and
//! `{{unsubscribeUrl}}`. The review step shows a preview filled with sample
//! values; [`render_for`] fills them from an actual recipient.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::recipients::Recipient;

/// Shown in place of an empty message.
pub const EMPTY_PREVIEW: &str = "Your SMS message will appear here...";

/// Sample link substituted for `{{unsubscribeUrl}}` in previews.
pub const SAMPLE_UNSUBSCRIBE_URL: &str = "https://example.com/unsubscribe";

/// Placeholders recognised by the wizard.
pub const PLACEHOLDERS: [&str; 4] = ["firstName", "lastName", "company", "unsubscribeUrl"];

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid regex"));

/// Replace known placeholders using `lookup`; unknown ones are left as-is.
fn substitute(message: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    PLACEHOLDER_RE
        .replace_all(message, |caps: &Captures<'_>| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Preview with sample values.
pub fn preview(message: &str) -> String {
    if message.is_empty() {
        return EMPTY_PREVIEW.to_string();
    }
    substitute(message, |name| {
        let value = match name {
            "firstName" => "John",
            "lastName" => "Doe",
            "company" => "Acme Corp",
            "unsubscribeUrl" => SAMPLE_UNSUBSCRIBE_URL,
            _ => return None,
        };
        Some(value.to_string())
    })
}

/// Render a message for one recipient. Missing fields become empty strings.
pub fn render_for(message: &str, recipient: &Recipient, unsubscribe_url: &str) -> String {
    substitute(message, |name| match name {
        "firstName" => Some(recipient.first_name.clone().unwrap_or_default()),
        "lastName" => Some(recipient.last_name.clone().unwrap_or_default()),
        "company" => Some(recipient.company.clone().unwrap_or_default()),
        "unsubscribeUrl" => Some(unsubscribe_url.to_string()),
        _ => None,
    })
}

/// Placeholder names used in a message, in order of first appearance.
pub fn placeholders_in(message: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(message) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
