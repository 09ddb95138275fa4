//! Matrix schema resolver
//!
//! Finds matrix questions that carry a "Room Type as Listed on Website" column
//! and maps each of their rows to a room index. Runs once per form.

use crate::models::{FormSchema, MatrixLabel, MatrixRoomLocator};
use crate::utils::text::normalize_label;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Column label (normalized) that holds the room's display name
pub const ROOM_NAME_COLUMN: &str = "room type as listed on website";

fn room_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"room\s*type\s*(\d+)").expect("valid regex"))
}

/// Build one locator per row of every room-name matrix in `schema`.
///
/// Matrices without the room-name column are skipped silently; not every form
/// uses the matrix layout.
///
/// # Returns
/// Locators in schema order. A row whose label names no room index stands
/// for the room at its position.
pub fn discover_room_matrices(schema: &FormSchema) -> Vec<MatrixRoomLocator> {
    let mut locators = Vec::new();

    for question in schema.questions.iter().filter(|q| q.is_matrix()) {
        let columns: Vec<String> = question
            .columns
            .iter()
            .map(|c| normalize_label(&c.text))
            .collect();
        let Some(col_index) = columns.iter().position(|c| c == ROOM_NAME_COLUMN) else {
            continue;
        };
        let col_id = question.columns[col_index].id.clone();

        let unlabeled = [MatrixLabel::new("", None)];
        let rows: &[MatrixLabel] = if question.rows.is_empty() {
            &unlabeled
        } else {
            &question.rows
        };

        for (row_index, row) in rows.iter().enumerate() {
            let room_index = room_index_from_label(&row.text).unwrap_or(row_index + 1);
            locators.push(MatrixRoomLocator {
                qid: question.qid.clone(),
                row_index,
                col_index,
                room_index,
                row_label: row.text.clone(),
                row_id: row.id.clone(),
                col_id: col_id.clone(),
            });
        }

        debug!(
            "matrix {} holds room names in column {} ({} rows)",
            question.qid,
            col_index,
            rows.len()
        );
    }

    locators
}

/// Parse `N` out of a "Room Type N" row label
fn room_index_from_label(label: &str) -> Option<usize> {
    room_number_re()
        .captures(&normalize_label(label))
        .and_then(|caps| caps[1].parse().ok())
}
