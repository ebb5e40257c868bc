use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::SessionError;

/// Question identifier. The backend sends either strings or integers, both
/// are kept in their canonical string form so feedback joins by value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        QuestionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(id: &str) -> Self {
        QuestionId(id.to_string())
    }
}

impl From<String> for QuestionId {
    fn from(id: String) -> Self {
        QuestionId(id)
    }
}

impl From<i64> for QuestionId {
    fn from(id: i64) -> Self {
        QuestionId(id.to_string())
    }
}

impl<'de> Deserialize<'de> for QuestionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum WireId {
            Int(i64),
            Text(String),
        }

        Ok(match WireId::deserialize(deserializer)? {
            WireId::Int(id) => QuestionId::from(id),
            WireId::Text(id) => QuestionId(id),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    TrueFalse,
    ShortAnswer,
    LongAnswer,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "single_choice",
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::ShortAnswer => "short_answer",
            QuestionKind::LongAnswer => "long_answer",
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionKind::SingleChoice | QuestionKind::TrueFalse)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = SessionError;

    /// Accepts the type labels the backend uses across quiz variants.
    /// Case, dashes and spaces are not significant.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let label = value.trim().to_lowercase().replace(['-', ' '], "_");
        match label.as_str() {
            "multiple_choice" | "objective" | "single_choice" => Ok(QuestionKind::SingleChoice),
            "true_false" => Ok(QuestionKind::TrueFalse),
            "theory" | "subjective" | "long_answer" => Ok(QuestionKind::LongAnswer),
            "short_answer" | "fill_in_the_blank" => Ok(QuestionKind::ShortAnswer),
            _ => Err(SessionError::UnsupportedQuestionType(value.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionOption {
    pub key: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    /// Only set on graded copies held by a result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

impl Question {
    pub fn option(&self, key: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|opt| opt.key == key)
    }

    /// Resolves a user-supplied value to the option key it names.
    /// Keys win over labels when both match.
    pub fn resolve_key(&self, value: &str) -> Option<&str> {
        self.option(value)
            .or_else(|| self.options.iter().find(|opt| opt.label == value))
            .map(|opt| opt.key.as_str())
    }

    /// Text shown for a stored answer: `"A. Paris"` for choices, raw text otherwise.
    pub fn display_answer(&self, value: &str) -> String {
        match self.option(value) {
            Some(opt) => format!("{}. {}", opt.key, opt.label),
            None => value.to_string(),
        }
    }

    pub fn with_correct_answer(&self, correct_answer: Option<String>) -> Self {
        Question {
            correct_answer,
            ..self.clone()
        }
    }
}
