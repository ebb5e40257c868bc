use serde_json::{Map, Value};

use crate::errors::{SessionError, SessionResult};
use crate::models::domain::question::{Question, QuestionId, QuestionKind, QuestionOption};
use crate::models::dto::response::{value_text, OptionSet, RawQuestion};

pub struct QuestionNormalizer;

impl QuestionNormalizer {
    /// Converts one backend record into a `Question`.
    ///
    /// `position` is the record's index in the fetched list and supplies the
    /// id when the record has none. A missing prompt becomes an empty string;
    /// any `correct_answer` on the record is dropped.
    pub fn normalize(raw: &RawQuestion, position: usize) -> SessionResult<Question> {
        let id = raw
            .id
            .clone()
            .unwrap_or_else(|| QuestionId::from((position + 1) as i64));
        let text = raw.text.clone().unwrap_or_default();
        let declared = raw
            .question_type
            .as_deref()
            .map(str::parse::<QuestionKind>)
            .transpose()?;

        let options = raw
            .options
            .as_ref()
            .map(Self::options_from)
            .filter(|options| !options.is_empty());

        let (kind, options) = match (declared, options) {
            (Some(kind @ (QuestionKind::ShortAnswer | QuestionKind::LongAnswer)), _) => {
                (kind, Vec::new())
            }
            (Some(QuestionKind::TrueFalse), Some(options)) => (QuestionKind::TrueFalse, options),
            (Some(QuestionKind::TrueFalse), None) => (QuestionKind::TrueFalse, true_false_options()),
            (_, Some(options)) => (QuestionKind::SingleChoice, options),
            (None, None) => (QuestionKind::LongAnswer, Vec::new()),
            (Some(QuestionKind::SingleChoice), None) => {
                return Err(SessionError::UnsupportedQuestionType(format!(
                    "{} without options",
                    raw.question_type.as_deref().unwrap_or_default()
                )));
            }
        };

        Ok(Question {
            id,
            text,
            kind,
            options,
            correct_answer: None,
        })
    }

    /// Like [`normalize`](Self::normalize), but a record that cannot be
    /// normalized is rendered as a free-text `long_answer` question instead
    /// of failing the whole set.
    pub fn normalize_or_fallback(raw: &RawQuestion, position: usize) -> Question {
        match Self::normalize(raw, position) {
            Ok(question) => question,
            Err(err) => {
                log::warn!(
                    "Question at position {} degraded to long_answer: {}",
                    position,
                    err
                );
                Question {
                    id: raw
                        .id
                        .clone()
                        .unwrap_or_else(|| QuestionId::from((position + 1) as i64)),
                    text: raw.text.clone().unwrap_or_default(),
                    kind: QuestionKind::LongAnswer,
                    options: Vec::new(),
                    correct_answer: None,
                }
            }
        }
    }

    /// Normalizes a full set, keeping source order and making ids unique.
    pub fn normalize_all(raw_questions: &[RawQuestion]) -> Vec<Question> {
        let mut questions: Vec<Question> = Vec::with_capacity(raw_questions.len());
        for (position, raw) in raw_questions.iter().enumerate() {
            let mut question = Self::normalize_or_fallback(raw, position);
            if questions.iter().any(|q| q.id == question.id) {
                let unique = QuestionId::new(format!("{}#{}", question.id, position + 1));
                log::warn!(
                    "Duplicate question id {} at position {}, using {}",
                    question.id,
                    position,
                    unique
                );
                question.id = unique;
            }
            questions.push(question);
        }
        questions
    }

    fn options_from(option_set: &OptionSet) -> Vec<QuestionOption> {
        match option_set {
            OptionSet::List(items) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| QuestionOption {
                    key: option_letter(idx),
                    label: value_text(item).unwrap_or_default(),
                })
                .collect(),
            OptionSet::Keyed(map) => map
                .iter()
                .map(|(key, label)| QuestionOption {
                    key: key.clone(),
                    label: value_text(label).unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Turns a normalized question back into a record with keyed options, the
/// inverse used to check that normalization is stable.
impl From<&Question> for RawQuestion {
    fn from(question: &Question) -> Self {
        let options = if question.options.is_empty() {
            None
        } else {
            let map: Map<String, Value> = question
                .options
                .iter()
                .map(|opt| (opt.key.clone(), Value::String(opt.label.clone())))
                .collect();
            Some(OptionSet::Keyed(map))
        };

        RawQuestion {
            id: Some(question.id.clone()),
            text: Some(question.text.clone()),
            question_type: Some(question.kind.as_str().to_string()),
            options,
            correct_answer: None,
        }
    }
}

/// `A`..`Z`, then `AA`, `AB`, ... for long lists.
pub fn option_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn true_false_options() -> Vec<QuestionOption> {
    ["True", "False"]
        .iter()
        .map(|label| QuestionOption {
            key: label.to_string(),
            label: label.to_string(),
        })
        .collect()
}
