//! Text normalization helpers
//!
//! Pure functions used for every label comparison and every folder name.

use regex::{Captures, Regex};
use std::sync::OnceLock;

const MAX_NAME_CHARS: usize = 80;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"))
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("valid regex")
    })
}

fn unsafe_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\-]").expect("valid regex"))
}

/// Collapse internal whitespace, trim and lowercase.
///
/// Every label comparison goes through this so capitalization or spacing
/// drift between form revisions does not break matching.
pub fn normalize_label(s: &str) -> String {
    whitespace_re()
        .replace_all(s.trim(), " ")
        .to_lowercase()
}

/// Remove markup, decode entities, trim
pub fn strip_rich_text(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let without_tags = tag_re().replace_all(value, "");
    decode_entities(&without_tags).trim().to_string()
}

/// Decode named (`&amp;` etc.) and numeric (`&#39;`, `&#x27;`) entities.
/// Unknown entities are left untouched.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    entity_re()
        .replace_all(s, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(body)
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "ndash" => Some('–'),
        "mdash" => Some('—'),
        "rsquo" => Some('’'),
        "lsquo" => Some('‘'),
        "rdquo" => Some('”'),
        "ldquo" => Some('“'),
        "hellip" => Some('…'),
        _ => None,
    }
}

/// Make a string safe as a folder or file name.
///
/// Every character other than word characters and `-` becomes `_`; the result
/// is capped at 80 characters and is never empty.
pub fn sanitize(name: &str) -> String {
    let replaced = unsafe_name_re().replace_all(name.trim(), "_");
    let truncated: String = replaced.chars().take(MAX_NAME_CHARS).collect();
    if truncated.is_empty() {
        "Unnamed".to_string()
    } else {
        truncated
    }
}

/// Short room name: first sentence of the stripped text, at most 5 words,
/// joined with `_`.
///
/// Earlier runs used this as the folder name, so it is one of the legacy
/// names the folder reconciler looks for.
pub fn simplify_room(value: &str) -> String {
    let text = strip_rich_text(value);
    let first = text
        .split(|c| matches!(c, '.' | ':' | ';' | '\n'))
        .next()
        .unwrap_or_default();
    let words: Vec<&str> = first.split_whitespace().take(5).collect();
    if words.is_empty() {
        "Room".to_string()
    } else {
        words.join("_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Room  Type\t1 >>\nName "), "room type 1 >> name");
        assert_eq!(normalize_label(""), "");
    }

    #[test]
    fn test_strip_rich_text() {
        assert_eq!(strip_rich_text("<p><b>Deluxe</b> King &amp; Sofa</p> "), "Deluxe King & Sofa");
        assert_eq!(strip_rich_text("Tom&#39;s &#x41;partment"), "Tom's Apartment");
        assert_eq!(strip_rich_text("&bogus; stays"), "&bogus; stays");
        assert_eq!(strip_rich_text(""), "");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(" Deluxe King (City View) "), "Deluxe_King__City_View_");
        assert_eq!(sanitize("Hôtel-Été"), "Hôtel-Été");
        assert_eq!(sanitize("   "), "Unnamed");
        assert_eq!(sanitize(&"x".repeat(100)).chars().count(), 80);
    }

    #[test]
    fn test_simplify_room() {
        assert_eq!(
            simplify_room("Deluxe King Room with City View and Balcony. 35 sqm"),
            "Deluxe_King_Room_with_City"
        );
        assert_eq!(simplify_room("<p>Suite: ocean</p>"), "Suite");
        assert_eq!(simplify_room(""), "Room");
    }
}
