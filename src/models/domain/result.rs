use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::question::Question;
use crate::models::dto::response::ScoreRaw;
use crate::services::scoring::format_percentage;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Correctness {
    Correct,
    Partial,
    Incorrect,
    /// The backend returned no feedback for this question.
    Ungraded,
}

impl Correctness {
    pub fn from_score(score: f64) -> Self {
        if score >= 1.0 {
            Correctness::Correct
        } else if score > 0.0 {
            Correctness::Partial
        } else {
            Correctness::Incorrect
        }
    }
}

impl fmt::Display for Correctness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Correctness::Correct => write!(f, "correct"),
            Correctness::Partial => write!(f, "partial"),
            Correctness::Incorrect => write!(f, "incorrect"),
            Correctness::Ungraded => write!(f, "ungraded"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultRow {
    /// Graded copy: `correct_answer` is revealed here.
    pub question: Question,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_answer: Option<String>,
    pub correctness: Correctness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub feedback: String,
}

impl ResultRow {
    pub fn correct_answer(&self) -> Option<&str> {
        self.question.correct_answer.as_deref()
    }
}

impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chosen = self
            .chosen_answer
            .as_deref()
            .map(|a| self.question.display_answer(a))
            .unwrap_or_else(|| "(no answer)".to_string());
        let correct = self
            .correct_answer()
            .map(|a| self.question.display_answer(a))
            .unwrap_or_else(|| "-".to_string());

        writeln!(f, "[{}] {}", self.correctness, self.question.text)?;
        writeln!(f, "  Your answer: {}", chosen)?;
        write!(f, "  Correct answer: {}", correct)?;
        if !self.feedback.is_empty() {
            write!(f, "\n  Feedback: {}", self.feedback)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssessmentResult {
    pub score_raw: ScoreRaw,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u32>,
    pub rows: Vec<ResultRow>,
    pub submitted_at: DateTime<Utc>,
}

impl AssessmentResult {
    pub fn percentage_text(&self) -> String {
        format_percentage(&self.score_raw)
    }

    pub fn count(&self, correctness: Correctness) -> usize {
        self.rows
            .iter()
            .filter(|row| row.correctness == correctness)
            .count()
    }
}

impl fmt::Display for AssessmentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Score: {}", self.percentage_text())?;
        for (idx, row) in self.rows.iter().enumerate() {
            write!(f, "\n{}. {}", idx + 1, row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correctness_thresholds() {
        assert_eq!(Correctness::from_score(1.0), Correctness::Correct);
        assert_eq!(Correctness::from_score(1.5), Correctness::Correct);
        assert_eq!(Correctness::from_score(0.5), Correctness::Partial);
        assert_eq!(Correctness::from_score(0.0), Correctness::Incorrect);
        assert_eq!(Correctness::from_score(-1.0), Correctness::Incorrect);
    }

    #[test]
    fn percentage_text_falls_back_to_raw_score() {
        let result = AssessmentResult {
            score_raw: ScoreRaw::Text("awaiting review".to_string()),
            percentage: None,
            rows: Vec::new(),
            submitted_at: Utc::now(),
        };

        assert_eq!(result.percentage_text(), "awaiting review");
        assert_eq!(result.to_string(), "Score: awaiting review");
    }

    #[test]
    fn correctness_serializes_lowercase() {
        let json = serde_json::to_string(&Correctness::Partial).unwrap();
        assert_eq!(json, "\"partial\"");
    }
}
