use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::domain::question::QuestionId;

/// Options as the backend sends them: a plain list, or a mapping whose keys
/// are the option keys. Mapping order is preserved.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OptionSet {
    List(Vec<Value>),
    Keyed(Map<String, Value>),
}

/// One question record as returned by the question-set endpoint, before
/// normalization.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawQuestion {
    #[serde(default, alias = "question_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<QuestionId>,
    #[serde(
        default,
        alias = "question",
        alias = "question_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionSet>,
    /// Never forwarded: the normalizer drops it so answers cannot leak before grading.
    #[serde(default, alias = "correctAnswer", skip_serializing)]
    pub correct_answer: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct QuestionSetResponse {
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
    #[serde(
        default,
        alias = "timeLimitMinutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_limit_minutes: Option<f64>,
}

impl QuestionSetResponse {
    pub fn time_limit_seconds(&self) -> Option<u32> {
        self.time_limit_minutes
            .filter(|minutes| minutes.is_finite() && *minutes > 0.0)
            .map(|minutes| (minutes * 60.0).round() as u32)
    }
}

/// Overall score in either of the shapes the backend produces:
/// `"7/10"`, `"91%"` or a bare number.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScoreRaw {
    Number(f64),
    Text(String),
}

impl fmt::Display for ScoreRaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreRaw::Number(n) => write!(f, "{}", n),
            ScoreRaw::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FeedbackEntry {
    #[serde(alias = "question_id")]
    pub id: QuestionId,
    #[serde(default)]
    pub score: f64,
    #[serde(default, alias = "userAnswer", skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<Value>,
    #[serde(
        default,
        alias = "correctAnswer",
        skip_serializing_if = "Option::is_none"
    )]
    pub correct_answer: Option<Value>,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SubmitAnswersResponse {
    #[serde(rename = "score", alias = "scoreRaw", alias = "score_raw")]
    pub score_raw: ScoreRaw,
    #[serde(default)]
    pub feedback: Vec<FeedbackEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct CredentialResponse {
    #[serde(default, alias = "apiKey")]
    pub api_key: Option<String>,
}

/// Renders a loosely typed JSON value as display text.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_question_accepts_field_aliases() {
        let raw: RawQuestion = serde_json::from_value(json!({
            "question_id": 3,
            "question": "Explain ownership",
            "type": "theory"
        }))
        .expect("aliases should deserialize");

        assert_eq!(raw.id, Some(QuestionId::from(3)));
        assert_eq!(raw.text.as_deref(), Some("Explain ownership"));
        assert_eq!(raw.question_type.as_deref(), Some("theory"));
        assert!(raw.options.is_none());
    }

    #[test]
    fn option_set_distinguishes_list_and_mapping() {
        let list: OptionSet = serde_json::from_value(json!(["Paris", "London"])).unwrap();
        let keyed: OptionSet =
            serde_json::from_value(json!({"x": "Paris", "y": "London"})).unwrap();

        assert!(matches!(list, OptionSet::List(ref items) if items.len() == 2));
        match keyed {
            OptionSet::Keyed(map) => {
                let keys: Vec<_> = map.keys().cloned().collect();
                assert_eq!(keys, vec!["x", "y"]);
            }
            other => panic!("expected keyed options, got {:?}", other),
        }
    }

    #[test]
    fn correct_answer_is_never_serialized() {
        let raw = RawQuestion {
            id: Some(QuestionId::from(1)),
            text: Some("2 + 2?".to_string()),
            correct_answer: Some(json!("4")),
            ..RawQuestion::default()
        };

        let json = serde_json::to_value(&raw).unwrap();
        assert!(json.get("correct_answer").is_none());
    }

    #[test]
    fn time_limit_minutes_converts_to_seconds() {
        let response: QuestionSetResponse =
            serde_json::from_value(json!({"questions": [], "timeLimitMinutes": 1.5})).unwrap();

        assert_eq!(response.time_limit_seconds(), Some(90));
        assert_eq!(QuestionSetResponse::default().time_limit_seconds(), None);
    }

    #[test]
    fn submit_response_accepts_both_score_shapes() {
        let text: SubmitAnswersResponse =
            serde_json::from_value(json!({"scoreRaw": "7/10", "feedback": []})).unwrap();
        let number: SubmitAnswersResponse =
            serde_json::from_value(json!({"score": 82})).unwrap();

        assert_eq!(text.score_raw, ScoreRaw::Text("7/10".to_string()));
        assert_eq!(number.score_raw, ScoreRaw::Number(82.0));
        assert!(number.feedback.is_empty());
    }

    #[test]
    fn value_text_handles_non_strings() {
        assert_eq!(value_text(&json!("A")), Some("A".to_string()));
        assert_eq!(value_text(&json!(true)), Some("true".to_string()));
        assert_eq!(value_text(&Value::Null), None);
    }
}
