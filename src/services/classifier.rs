//! Submission classifier
//!
//! Binds one submission's answers to a [`ResolvedEntity`]. Each target field
//! owns an ordered [`FieldRules`] list: known question ids first, then exact
//! label variants seen on past form revisions, then a loose substring match.
//! Ids are seeded from a baseline and extended from the live schema labels.

use crate::models::entity::extend_unique;
use crate::models::{FormSchema, MatrixRoomLocator, ResolvedEntity, Submission, ROOM_INDICES, UNKNOWN_HOTEL};
use crate::services::answer_extractor::{
    extract_file_urls, extract_room_name_from_matrix, room_name_at,
};
use crate::utils::text::{normalize_label, sanitize, strip_rich_text};
use std::collections::BTreeSet;
use tracing::debug;

// Baseline question ids, used when the schema labels give nothing better
const QID_HOTEL_NAME: &str = "33";
const QID_HOTEL_IMAGES: &str = "393";
const QID_ROOM_ASSETS: [&str; 5] = ["378", "384", "385", "392", "388"];
const QID_ROOM_MATRIX: [&str; 5] = ["427", "431", "432", "433", "434"];

const HOTEL_IMAGES_LABEL: &str = "Hotel Images - ie, Primary Hotel Image + lobby, gym, exterior, pool/outdoor space, restaurant/bar, etc.";
const ROOM_BLOCK_INTRO: &str = "The following section is where you will submit your room block and provide all information about each room. This information should be exactly the same as what can be found on your Hotel's website. NOTE: WE DO NOT OFFER A ROH ROOM CATEGORY.";

/// One way a question can be recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// Question id is one of these
    QuestionId(BTreeSet<String>),
    /// Normalized label equals one of these
    LabelExact(BTreeSet<String>),
    /// Normalized label contains every one of these
    LabelContainsAll(Vec<String>),
}

impl MatchRule {
    fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MatchRule::QuestionId(ids.into_iter().map(Into::into).collect())
    }

    fn exact<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        MatchRule::LabelExact(labels.into_iter().map(|l| normalize_label(l.as_ref())).collect())
    }

    fn contains_all<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MatchRule::LabelContainsAll(parts.into_iter().map(Into::into).collect())
    }

    /// `label` must already be normalized
    pub fn matches(&self, qid: &str, label: &str) -> bool {
        match self {
            MatchRule::QuestionId(ids) => ids.contains(qid),
            MatchRule::LabelExact(labels) => labels.contains(label),
            MatchRule::LabelContainsAll(parts) => {
                !label.is_empty() && parts.iter().all(|p| label.contains(p.as_str()))
            }
        }
    }
}

/// Ordered rules for one target field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRules {
    pub field: String,
    pub rules: Vec<MatchRule>,
}

impl FieldRules {
    fn new(field: impl Into<String>, rules: Vec<MatchRule>) -> Self {
        Self {
            field: field.into(),
            rules,
        }
    }

    /// Position of the first rule that accepts the question
    pub fn matched_rule(&self, qid: &str, label: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.matches(qid, label))
    }

    pub fn matches(&self, qid: &str, label: &str) -> bool {
        self.matched_rule(qid, label).is_some()
    }
}

/// Rule lists for every target field of one form
#[derive(Debug, Clone)]
pub struct ClassifierRules {
    pub hotel_name: FieldRules,
    pub hotel_images: FieldRules,
    /// Index 0 holds room 1
    pub room_names: Vec<FieldRules>,
    pub room_assets: Vec<FieldRules>,
}

impl ClassifierRules {
    /// Baseline rules extended with ids discovered from `schema` labels
    pub fn for_schema(schema: &FormSchema) -> Self {
        let mut hotel_name_ids: BTreeSet<String> = [QID_HOTEL_NAME.to_string()].into();
        let mut hotel_image_ids: BTreeSet<String> = [QID_HOTEL_IMAGES.to_string()].into();
        let mut room_asset_ids: Vec<BTreeSet<String>> = QID_ROOM_ASSETS
            .iter()
            .map(|id| [id.to_string()].into())
            .collect();

        for question in &schema.questions {
            let label = normalize_label(&question.text);
            if label.contains("hotel name") {
                hotel_name_ids.insert(question.qid.clone());
            }
            if label.contains("hotel images") || label.contains("primary hotel image") {
                hotel_image_ids.insert(question.qid.clone());
            }
            let mentions_upload =
                label.contains("upload") || label.contains("image") || label.contains("photo");
            for i in ROOM_INDICES {
                if mentions_upload && label.contains(&format!("room type {i}")) {
                    room_asset_ids[i - 1].insert(question.qid.clone());
                }
            }
        }

        let room_names = ROOM_INDICES
            .map(|i| {
                FieldRules::new(
                    format!("room_name_{i}"),
                    vec![
                        MatchRule::ids([QID_ROOM_MATRIX[i - 1]]),
                        MatchRule::exact(room_name_label_variants(i)),
                        MatchRule::contains_all([
                            format!("room type {i}"),
                            "listed on website".to_string(),
                        ]),
                    ],
                )
            })
            .collect();

        let room_assets = ROOM_INDICES
            .zip(room_asset_ids)
            .map(|(i, ids)| {
                FieldRules::new(
                    format!("room_assets_{i}"),
                    vec![
                        MatchRule::QuestionId(ids),
                        MatchRule::exact([format!("Please upload images of the Room Type {i}.")]),
                    ],
                )
            })
            .collect();

        Self {
            hotel_name: FieldRules::new(
                "hotel_name",
                vec![
                    MatchRule::QuestionId(hotel_name_ids),
                    MatchRule::contains_all(["hotel name"]),
                ],
            ),
            hotel_images: FieldRules::new(
                "hotel_images",
                vec![
                    MatchRule::QuestionId(hotel_image_ids),
                    MatchRule::exact([HOTEL_IMAGES_LABEL]),
                ],
            ),
            room_names,
            room_assets,
        }
    }
}

/// Room-name labels seen on earlier revisions of the form
fn room_name_label_variants(i: usize) -> Vec<String> {
    let mut variants = vec![
        format!("Room Type {i} Information >> Room Type {i} >> Room Type as Listed on Website"),
        format!("Room Type {i} >> Room Type as Listed on Website"),
    ];
    if i == 1 {
        variants.push(format!(
            "{ROOM_BLOCK_INTRO} >> Room Type 1 >> Room Type as Listed on Website"
        ));
    }
    variants
}

/// Classifier for all submissions of one form
pub struct SubmissionClassifier {
    rules: ClassifierRules,
    locators: Vec<MatrixRoomLocator>,
    allowed_extensions: Vec<String>,
}

impl SubmissionClassifier {
    /// # Parameters
    /// - `schema`: the form's questions; labels there add ids to the baseline rules
    /// - `locators`: from [`discover_room_matrices`](crate::services::matrix_resolver::discover_room_matrices)
    /// - `allowed_extensions`: normalized, without the dot
    pub fn new(
        schema: &FormSchema,
        locators: Vec<MatrixRoomLocator>,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            rules: ClassifierRules::for_schema(schema),
            locators,
            allowed_extensions,
        }
    }

    /// Resolve hotel, hotel images and the five room slots for `submission`.
    ///
    /// # Returns
    /// The entity with a sanitized hotel name ([`UNKNOWN_HOTEL`] when none
    /// matched); rooms without a name keep an empty `name`
    pub fn classify(&self, submission: &Submission) -> ResolvedEntity {
        let mut entity = ResolvedEntity::default();
        let mut hotel: Option<String> = None;

        for (qid, answer) in &submission.answers {
            let label = normalize_label(&answer.label);
            let value = &answer.value;

            if hotel.is_none() && self.rules.hotel_name.matches(qid, &label) {
                let name = strip_rich_text(&value.flatten_text());
                if !name.is_empty() {
                    hotel = Some(sanitize(&name));
                }
            }

            if self.rules.hotel_images.matches(qid, &label) {
                extend_unique(
                    &mut entity.hotel_image_urls,
                    extract_file_urls(value, &self.allowed_extensions),
                );
            }

            for i in ROOM_INDICES {
                let slot = &mut entity.rooms[i - 1];
                if slot.name.is_empty()
                    && !value.is_empty()
                    && self.rules.room_names[i - 1].matches(qid, &label)
                {
                    slot.name = extract_room_name_from_matrix(value, qid, i, &self.locators);
                }
                if self.rules.room_assets[i - 1].matches(qid, &label) {
                    extend_unique(
                        &mut slot.asset_urls,
                        extract_file_urls(value, &self.allowed_extensions),
                    );
                }
            }
        }

        self.fill_names_from_locators(submission, &mut entity);

        entity.hotel = hotel.unwrap_or_else(|| UNKNOWN_HOTEL.to_string());
        debug!(
            "submission {} -> hotel {}, {} hotel image(s)",
            submission.id,
            entity.hotel,
            entity.hotel_image_urls.len()
        );
        entity
    }

    /// Second pass: fill names still missing straight from matrix cells
    fn fill_names_from_locators(&self, submission: &Submission, entity: &mut ResolvedEntity) {
        for locator in &self.locators {
            let Some(slot) = entity.room_mut(locator.room_index) else {
                continue;
            };
            if !slot.name.is_empty() {
                continue;
            }
            let Some(answer) = submission.answer(&locator.qid) else {
                continue;
            };
            if answer.value.is_empty() {
                continue;
            }
            slot.name = room_name_at(&answer.value, locator);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Answer, AnswerValue};
    use crate::services::matrix_resolver::discover_room_matrices;
    use serde_json::json;

    fn allowed() -> Vec<String> {
        vec!["jpg".into(), "png".into()]
    }

    fn submission(answers: Vec<(&str, &str, serde_json::Value)>) -> Submission {
        Submission {
            id: "s1".into(),
            answers: answers
                .into_iter()
                .map(|(qid, label, value)| {
                    (qid.to_string(), Answer::new(label, AnswerValue::from(&value)))
                })
                .collect(),
        }
    }

    fn classifier(schema: serde_json::Value) -> SubmissionClassifier {
        let schema = FormSchema::from_json("f", &schema);
        let locators = discover_room_matrices(&schema);
        SubmissionClassifier::new(&schema, locators, allowed())
    }

    #[test]
    fn test_rule_order_is_id_then_exact_then_loose() {
        let rules = ClassifierRules::for_schema(&FormSchema::default());
        let room2 = &rules.room_names[1];
        assert_eq!(room2.matched_rule("431", ""), Some(0));
        assert_eq!(
            room2.matched_rule("x", "room type 2 >> room type as listed on website"),
            Some(1)
        );
        assert_eq!(
            room2.matched_rule("x", "block b >> room type 2 name as listed on website"),
            Some(2)
        );
        assert_eq!(room2.matched_rule("x", "room type 3 >> room type as listed on website"), None);
    }

    #[test]
    fn test_schema_labels_extend_id_sets() {
        let rules = ClassifierRules::for_schema(&FormSchema::from_json(
            "f",
            &json!({
                "7": {"type": "control_textbox", "text": "Official Hotel Name"},
                "8": {"type": "control_fileupload", "text": "Primary Hotel Image"},
                "9": {"type": "control_fileupload", "text": "Room Type 3 photos"}
            }),
        ));
        assert!(rules.hotel_name.matches("7", ""));
        assert!(rules.hotel_images.matches("8", ""));
        assert!(rules.room_assets[2].matches("9", ""));
        assert!(!rules.room_assets[1].matches("9", ""));
    }

    #[test]
    fn test_classify_direct_labels() {
        let c = classifier(json!({}));
        let sub = submission(vec![
            ("33", "Hotel Name", json!("The Grand, Amsterdam")),
            ("99", "Another hotel name", json!("Ignored")),
            ("393", "Hotel Images", json!(["https://a.com/lobby.jpg", "https://a.com/lobby.jpg"])),
            ("427", "Room Type 1 >> Room Type as Listed on Website", json!({"Room Type as Listed on Website": "Deluxe King"})),
            ("378", "Upload", json!("https://a.com/r1.png https://a.com/r1.txt")),
            ("500", "Please upload images of the Room Type 1.", json!(["https://a.com/r1b.png"])),
        ]);
        let entity = c.classify(&sub);
        assert_eq!(entity.hotel, "The_Grand__Amsterdam");
        assert_eq!(entity.hotel_image_urls, vec!["https://a.com/lobby.jpg"]);
        assert_eq!(entity.rooms[0].name, "Deluxe King");
        assert_eq!(
            entity.rooms[0].asset_urls,
            vec!["https://a.com/r1.png", "https://a.com/r1b.png"]
        );
        assert!(entity.rooms[1].name.is_empty());
    }

    #[test]
    fn test_first_room_name_wins() {
        let c = classifier(json!({}));
        let sub = submission(vec![
            ("427", "x", json!("First Name")),
            ("601", "Room Type 1 >> Room Type as Listed on Website", json!("Second Name")),
        ]);
        assert_eq!(c.classify(&sub).rooms[0].name, "First Name");
    }

    #[test]
    fn test_missing_hotel_defaults() {
        let c = classifier(json!({}));
        let sub = submission(vec![("33", "Hotel Name", json!(""))]);
        assert_eq!(c.classify(&sub).hotel, UNKNOWN_HOTEL);
    }

    #[test]
    fn test_second_pass_fills_names_from_matrix_cells() {
        let c = classifier(json!({
            "70": {
                "type": "control_matrix",
                "text": "Room block",
                "mcolumns": "Room Type|Room Type as Listed on Website|Size",
                "mrows": "Room Type 1|Room Type 2"
            }
        }));
        let sub = submission(vec![(
            "70",
            "Room block",
            json!([["", "Deluxe King", "30"], ["", "Suite", "50"]]),
        )]);
        let entity = c.classify(&sub);
        assert_eq!(entity.rooms[0].name, "Deluxe King");
        assert_eq!(entity.rooms[1].name, "Suite");
        assert!(entity.rooms[2].name.is_empty());
    }
}
