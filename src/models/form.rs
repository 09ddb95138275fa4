//! Form schema model
//!
//! Built once per form run from the `/form/{id}/questions` payload and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Question type that carries a rows × columns table
pub const MATRIX_TYPE: &str = "control_matrix";

/// A matrix row or column label, with the stable id when the form provides one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixLabel {
    pub text: String,
    pub id: Option<String>,
}

impl MatrixLabel {
    pub fn new(text: impl Into<String>, id: Option<&str>) -> Self {
        Self {
            text: text.into(),
            id: id.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    /// Parse a label list that may arrive as a JSON array, a JSON-array string,
    /// or a `|`-delimited string. Anything else yields an empty list.
    pub fn parse_list(raw: &Value) -> Vec<MatrixLabel> {
        match raw {
            Value::String(s) if s.trim_start().starts_with('[') => {
                match serde_json::from_str::<Vec<Value>>(s) {
                    Ok(items) => Self::from_items(&items),
                    Err(_) => Vec::new(),
                }
            }
            Value::String(s) => s
                .split('|')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| MatrixLabel::new(p, None))
                .collect(),
            Value::Array(items) => Self::from_items(items),
            _ => Vec::new(),
        }
    }

    fn from_items(items: &[Value]) -> Vec<MatrixLabel> {
        items
            .iter()
            .filter_map(|item| match item {
                Value::Object(map) => {
                    let text = map.get("text").map(value_to_string).unwrap_or_default();
                    let id = map.get("id").map(value_to_string);
                    Some(MatrixLabel::new(text, id.as_deref()))
                }
                Value::String(s) => Some(MatrixLabel::new(s.trim(), None)),
                _ => None,
            })
            .collect()
    }
}

/// Metadata for one form question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionMeta {
    pub qid: String,
    pub question_type: String,
    pub text: String,
    pub columns: Vec<MatrixLabel>,
    pub rows: Vec<MatrixLabel>,
}

impl QuestionMeta {
    pub fn is_matrix(&self) -> bool {
        self.question_type == MATRIX_TYPE
    }

    fn from_json(qid: &str, raw: &Value) -> Self {
        let text = raw.get("text").map(value_to_string).unwrap_or_default();
        let question_type = raw.get("type").map(value_to_string).unwrap_or_default();
        let columns = first_non_empty(raw, &["dcolumns", "mcolumns"])
            .map(MatrixLabel::parse_list)
            .unwrap_or_default();
        let rows = first_non_empty(raw, &["drows", "mrows"])
            .map(MatrixLabel::parse_list)
            .unwrap_or_default();

        Self {
            qid: qid.to_string(),
            question_type,
            text,
            columns,
            rows,
        }
    }
}

/// All question metadata for one form, in payload order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSchema {
    pub form_id: String,
    pub questions: Vec<QuestionMeta>,
}

impl FormSchema {
    /// Build from the `content` object of the questions endpoint.
    /// A non-object payload produces an empty schema.
    pub fn from_json(form_id: &str, content: &Value) -> Self {
        let questions = content
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(qid, raw)| QuestionMeta::from_json(qid, raw))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            form_id: form_id.to_string(),
            questions,
        }
    }
}

/// Where a room's display name lives inside a matrix answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRoomLocator {
    pub qid: String,
    pub row_index: usize,
    pub col_index: usize,
    pub room_index: usize,
    pub row_label: String,
    pub row_id: Option<String>,
    pub col_id: Option<String>,
}

/// Field value as a string; numbers and bools are rendered, null is empty
fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn first_non_empty<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| raw.get(*k)).find(|v| match v {
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Null => false,
        _ => true,
    })
}
