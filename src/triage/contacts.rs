//! Contact details found in email text.

use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d\-\s]{7,}\d").expect("Invalid phone regex"));

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("Invalid email regex")
});

/// First phone number in `text`.
pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_REGEX.find(text).map(|m| m.as_str().trim().to_string())
}

/// First e-mail address in `text`.
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_REGEX.find(text).map(|m| m.as_str().to_string())
}

/// Display name from a sender address: `john.doe@x.com` -> `John Doe`.
pub fn sender_name(sender: &str) -> String {
    let Some((local, _)) = sender.trim().split_once('@') else {
        return "Unknown".to_string();
    };
    let name = local
        .split(['.', '_'])
        .filter(|part| !part.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// First `max_chars` characters of the body, with `...` when cut.
pub fn preview(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &body[..byte_idx]),
        None => body.to_string(),
    }
}
