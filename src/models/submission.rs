//! Submission model
//!
//! Answers arrive schema-free: a string, a list (matrix rows may nest lists),
//! or an ordered mapping. [`AnswerValue`] keeps that shape explicit.

use serde_json::Value;

/// Raw answer shape
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnswerValue {
    #[default]
    Empty,
    Text(String),
    List(Vec<AnswerValue>),
    /// Key order is the order the API returned
    Map(Vec<(String, AnswerValue)>),
}

impl AnswerValue {
    /// True for missing values, empty strings, and empty containers
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Empty => true,
            AnswerValue::Text(s) => s.is_empty(),
            AnswerValue::List(items) => items.is_empty(),
            AnswerValue::Map(entries) => entries.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Map lookup by key
    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        match self {
            AnswerValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Leaf strings joined with a single space, depth-first
    pub fn flatten_text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join(" ")
    }

    fn collect_text<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            AnswerValue::Empty => {}
            AnswerValue::Text(s) => {
                let s = s.trim();
                if !s.is_empty() {
                    out.push(s);
                }
            }
            AnswerValue::List(items) => items.iter().for_each(|i| i.collect_text(out)),
            AnswerValue::Map(entries) => entries.iter().for_each(|(_, v)| v.collect_text(out)),
        }
    }
}

impl From<&Value> for AnswerValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => AnswerValue::Empty,
            Value::String(s) => AnswerValue::Text(s.clone()),
            Value::Bool(b) => AnswerValue::Text(b.to_string()),
            Value::Number(n) => AnswerValue::Text(n.to_string()),
            Value::Array(items) => AnswerValue::List(items.iter().map(AnswerValue::from).collect()),
            Value::Object(map) => AnswerValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), AnswerValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

/// One answered question: the label shown on the form plus the raw answer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Answer {
    pub label: String,
    pub value: AnswerValue,
}

impl Answer {
    pub fn new(label: impl Into<String>, value: AnswerValue) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// A single form submission; read-only input to the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Submission {
    pub id: String,
    /// `(question id, answer)` in payload order
    pub answers: Vec<(String, Answer)>,
}

impl Submission {
    /// Build from one element of the submissions endpoint's `content` array
    pub fn from_json(raw: &Value) -> Self {
        let id = match raw.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let answers = raw
            .get("answers")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(qid, entry)| {
                        let label = entry
                            .get("text")
                            .and_then(Value::as_str)
                            .unwrap_or_default();
                        let value = entry.get("answer").map(AnswerValue::from).unwrap_or_default();
                        (qid.clone(), Answer::new(label, value))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { id, answers }
    }

    pub fn answer(&self, qid: &str) -> Option<&Answer> {
        self.answers.iter().find(|(q, _)| q == qid).map(|(_, a)| a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_answer_order() {
        let raw = json!({
            "id": "5001",
            "answers": {
                "427": {"text": "Room Type 1", "answer": {"b": "2", "a": "1"}},
                "33": {"text": "Hotel Name", "answer": "Grand"},
                "50": {"text": "Header"}
            }
        });
        let sub = Submission::from_json(&raw);
        assert_eq!(sub.id, "5001");
        let qids: Vec<&str> = sub.answers.iter().map(|(q, _)| q.as_str()).collect();
        assert_eq!(qids, vec!["427", "33", "50"]);

        let matrix = &sub.answer("427").unwrap().value;
        match matrix {
            AnswerValue::Map(entries) => assert_eq!(entries[0].0, "b"),
            other => panic!("expected map, got {:?}", other),
        }
        assert!(sub.answer("50").unwrap().value.is_empty());
    }

    #[test]
    fn test_flatten_text_depth_first() {
        let v = AnswerValue::from(&json!({"first": " Grand ", "rest": ["", "Hotel"]}));
        assert_eq!(v.flatten_text(), "Grand Hotel");
    }
}
