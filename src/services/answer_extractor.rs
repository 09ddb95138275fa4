//! Answer extractor
//!
//! Pulls asset URLs and room names out of raw answers. Nothing here returns an
//! error: malformed values are skipped and extraction carries on.

use crate::models::{AnswerValue, MatrixRoomLocator};
use crate::utils::text::{normalize_label, strip_rich_text};
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use url::Url;

/// Column used when no locator matches; observed on one legacy form layout
const FALLBACK_NAME_COLUMN: usize = 3;

fn url_delimiter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s,]+").expect("valid regex"))
}

/// Extract downloadable file URLs from an upload answer.
///
/// Accepts a list of URL strings or a whitespace/comma delimited string.
/// URLs are re-serialized (path-unsafe characters percent-encoded), filtered
/// to `allowed_extensions` by the path suffix, and deduplicated in first-seen
/// order.
///
/// # Parameters
/// - `allowed_extensions`: lowercase, without the dot
///
/// # Returns
/// Normalized absolute http(s) URLs; empty for answers without any
pub fn extract_file_urls(value: &AnswerValue, allowed_extensions: &[String]) -> Vec<String> {
    let candidates: Vec<&str> = match value {
        AnswerValue::List(items) => items
            .iter()
            .filter_map(AnswerValue::as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect(),
        AnswerValue::Text(s) => url_delimiter_re()
            .split(s)
            .filter(|t| t.starts_with("http://") || t.starts_with("https://"))
            .collect(),
        _ => Vec::new(),
    };

    let mut out: Vec<String> = Vec::new();
    for candidate in candidates {
        let Some(url) = normalize_url(candidate) else {
            continue;
        };
        if has_allowed_extension(&url, allowed_extensions) && !out.contains(&url) {
            out.push(url);
        }
    }
    out
}

/// Parse and re-serialize a URL; `None` when it is not an absolute http(s) URL
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    let url = Url::parse(trimmed).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

/// Decoded last path segment of `url`, or `None` if there is none
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    let decoded = percent_decode_str(last).decode_utf8_lossy().into_owned();
    (!decoded.is_empty()).then_some(decoded)
}

fn has_allowed_extension(url: &str, allowed_extensions: &[String]) -> bool {
    file_name_from_url(url)
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            allowed_extensions.iter().any(|a| *a == ext)
        })
        .unwrap_or(false)
}

/// Resolve a room display name from any answer shape.
///
/// - text: cleaned via [`strip_rich_text`]
/// - mapping: a key mentioning "room type" and "listed on website" wins;
///   otherwise the first non-empty value, depth-first
/// - list: first non-empty element, depth-first
///
/// Returns an empty string when nothing is found.
pub fn extract_room_name(value: &AnswerValue) -> String {
    match value {
        AnswerValue::Empty => String::new(),
        AnswerValue::Text(s) => strip_rich_text(s),
        AnswerValue::Map(entries) => {
            for (key, val) in entries {
                let key = normalize_label(key);
                if !(key.contains("room type") && key.contains("listed on website")) {
                    continue;
                }
                if let AnswerValue::Text(s) = val {
                    let cleaned = strip_rich_text(s);
                    if !cleaned.is_empty() {
                        return cleaned;
                    }
                }
            }
            first_non_empty(entries.iter().map(|(_, v)| v))
        }
        AnswerValue::List(items) => first_non_empty(items.iter()),
    }
}

fn first_non_empty<'a>(values: impl Iterator<Item = &'a AnswerValue>) -> String {
    values
        .map(extract_room_name)
        .find(|name| !name.is_empty())
        .unwrap_or_default()
}

/// Matrix answers are a list of rows; anything else is a single row
fn matrix_rows(answer: &AnswerValue) -> &[AnswerValue] {
    match answer {
        AnswerValue::List(rows) => rows,
        other => std::slice::from_ref(other),
    }
}

/// Pick the locator's column out of one row: by column id when the row is a
/// mapping that has it, else by position.
fn cell<'a>(row: &'a AnswerValue, col_index: usize, col_id: Option<&str>) -> Option<&'a AnswerValue> {
    match row {
        AnswerValue::Map(entries) => col_id
            .and_then(|id| row.get(id))
            .or_else(|| entries.get(col_index).map(|(_, v)| v)),
        AnswerValue::List(items) => items.get(col_index),
        other => Some(other),
    }
}

/// Room name at exactly the cell `locator` points to
pub fn room_name_at(answer: &AnswerValue, locator: &MatrixRoomLocator) -> String {
    matrix_rows(answer)
        .get(locator.row_index)
        .and_then(|row| cell(row, locator.col_index, locator.col_id.as_deref()))
        .map(extract_room_name)
        .unwrap_or_default()
}

/// Room name for `room_index` from the answer to question `qid`.
///
/// Locators for this question and room are tried in order; the first non-empty
/// name wins. When none yields a name, the fourth column of the first row is
/// tried so forms without matrix metadata still resolve. Text and mapping
/// answers that are not tables are finally read with [`extract_room_name`].
///
/// # Returns
/// The cleaned name, or an empty string when the room stays unresolved
pub fn extract_room_name_from_matrix(
    answer: &AnswerValue,
    qid: &str,
    room_index: usize,
    locators: &[MatrixRoomLocator],
) -> String {
    let rows = matrix_rows(answer);
    if rows.is_empty() {
        return String::new();
    }

    let from_locators = locators
        .iter()
        .filter(|l| l.qid == qid && l.room_index == room_index)
        .map(|l| room_name_at(answer, l))
        .find(|name| !name.is_empty());
    if let Some(name) = from_locators {
        return name;
    }

    let fallback = match &rows[0] {
        AnswerValue::List(items) => items.get(FALLBACK_NAME_COLUMN),
        AnswerValue::Map(entries) => entries.get(FALLBACK_NAME_COLUMN).map(|(_, v)| v),
        _ => None,
    };
    if let Some(name) = fallback.map(extract_room_name).filter(|n| !n.is_empty()) {
        return name;
    }

    // Not a table at all: a plain answer to a room-name question
    match answer {
        AnswerValue::Text(_) | AnswerValue::Map(_) => extract_room_name(answer),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn allowed() -> Vec<String> {
        ["jpg", "jpeg", "png", "pdf", "webp", "gif"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn v(value: serde_json::Value) -> AnswerValue {
        AnswerValue::from(&value)
    }

    fn locator(qid: &str, row: usize, col: usize, room: usize, col_id: Option<&str>) -> MatrixRoomLocator {
        MatrixRoomLocator {
            qid: qid.into(),
            row_index: row,
            col_index: col,
            room_index: room,
            row_label: String::new(),
            row_id: None,
            col_id: col_id.map(str::to_string),
        }
    }

    #[test]
    fn test_urls_from_list_are_encoded_and_deduplicated() {
        let value = v(json!([
            "https://files.example.com/uploads/lobby photo.JPG",
            "https://files.example.com/uploads/lobby%20photo.JPG",
            "https://files.example.com/uploads/plan.pdf",
            "not a url.png",
            ""
        ]));
        assert_eq!(
            extract_file_urls(&value, &allowed()),
            vec![
                "https://files.example.com/uploads/lobby%20photo.JPG",
                "https://files.example.com/uploads/plan.pdf",
            ]
        );
    }

    #[test]
    fn test_urls_from_delimited_string() {
        let value = v(json!("https://a.com/1.png, https://a.com/2.webp\nhttps://a.com/1.png ftp://a.com/3.png"));
        assert_eq!(
            extract_file_urls(&value, &allowed()),
            vec!["https://a.com/1.png", "https://a.com/2.webp"]
        );
    }

    #[test]
    fn test_disallowed_or_missing_suffix_is_dropped() {
        assert!(extract_file_urls(&v(json!("https://a.com/notes.txt")), &allowed()).is_empty());
        assert!(extract_file_urls(&v(json!("https://a.com/download")), &allowed()).is_empty());
        assert!(extract_file_urls(&v(json!(["https://a.com/"])), &allowed()).is_empty());
        assert!(extract_file_urls(&AnswerValue::Empty, &allowed()).is_empty());
    }

    #[test]
    fn test_url_normalization_is_idempotent() {
        let first = extract_file_urls(&v(json!(["https://a.com/x y/ümlaut (1).jpg?s=1"])), &allowed());
        assert_eq!(first.len(), 1);
        let again = extract_file_urls(&AnswerValue::List(vec![AnswerValue::Text(first[0].clone())]), &allowed());
        assert_eq!(first, again);
    }

    #[test]
    fn test_file_name_is_decoded() {
        assert_eq!(
            file_name_from_url("https://a.com/u/lobby%20photo.jpg?x=1").as_deref(),
            Some("lobby photo.jpg")
        );
        assert_eq!(file_name_from_url("https://a.com/"), None);
    }

    #[test]
    fn test_room_name_prefers_listed_on_website_key() {
        let value = v(json!({
            "Square Feet": "400",
            "Room Type 1 >> Room Type as Listed on Website": "Deluxe King"
        }));
        assert_eq!(extract_room_name(&value), "Deluxe King");
    }

    #[test]
    fn test_room_name_depth_first_in_lists() {
        assert_eq!(extract_room_name(&v(json!([["", "Deluxe King"]]))), "Deluxe King");
        assert_eq!(extract_room_name(&v(json!([[], {"a": ""}, null]))), "");
        assert_eq!(extract_room_name(&v(json!("<b>Suite</b> &amp; Spa"))), "Suite & Spa");
    }

    #[test]
    fn test_matrix_name_by_locator_position() {
        let answer = v(json!([
            ["1", "Deluxe King", "400"],
            ["2", "Twin Room", "300"]
        ]));
        let locators = vec![locator("427", 0, 1, 1, None), locator("427", 1, 1, 2, None)];
        assert_eq!(extract_room_name_from_matrix(&answer, "427", 2, &locators), "Twin Room");
        assert_eq!(extract_room_name_from_matrix(&answer, "999", 2, &locators), "");
    }

    #[test]
    fn test_matrix_name_by_column_id() {
        let answer = v(json!([{"c_size": "400", "c_name": "Junior Suite"}]));
        let locators = vec![locator("8", 0, 0, 1, Some("c_name"))];
        assert_eq!(extract_room_name_from_matrix(&answer, "8", 1, &locators), "Junior Suite");
    }

    #[test]
    fn test_matrix_fallback_fourth_column() {
        let answer = v(json!([["a", "b", "c", "Garden Suite"]]));
        assert_eq!(extract_room_name_from_matrix(&answer, "1", 1, &[]), "Garden Suite");
        let short = v(json!([["a", "b", "c"]]));
        assert_eq!(extract_room_name_from_matrix(&short, "1", 1, &[]), "");
    }

    #[test]
    fn test_plain_answers_resolve_without_locators() {
        assert_eq!(extract_room_name_from_matrix(&v(json!("<p>Loft</p>")), "1", 1, &[]), "Loft");
        let keyed = v(json!({"Room Type as Listed on Website": "Studio"}));
        assert_eq!(extract_room_name_from_matrix(&keyed, "1", 1, &[]), "Studio");
    }

    #[test]
    fn test_locator_miss_falls_back() {
        let answer = v(json!([["x", "", "", "Loft"]]));
        let locators = vec![locator("1", 0, 1, 1, None)];
        assert_eq!(extract_room_name_from_matrix(&answer, "1", 1, &locators), "Loft");
    }
}
