use std::collections::{BTreeMap, HashMap};

use chrono::Utc;

use crate::models::domain::question::{Question, QuestionId};
use crate::models::domain::result::{AssessmentResult, Correctness, ResultRow};
use crate::models::dto::response::{value_text, FeedbackEntry, SubmitAnswersResponse};
use crate::services::pagination::{paginate, Page};
use crate::services::scoring::score_percentage;

pub struct ResultRenderer;

impl ResultRenderer {
    /// Joins backend feedback onto the question list by id.
    ///
    /// Rows keep question order. Questions without a feedback entry are
    /// `Ungraded`; feedback for ids not in the list is ignored.
    pub fn build(
        questions: &[Question],
        answers: &BTreeMap<QuestionId, String>,
        response: &SubmitAnswersResponse,
    ) -> AssessmentResult {
        let feedback: HashMap<&QuestionId, &FeedbackEntry> =
            response.feedback.iter().map(|f| (&f.id, f)).collect();

        for entry in &response.feedback {
            if !questions.iter().any(|q| q.id == entry.id) {
                log::warn!("Ignoring feedback for unknown question {}", entry.id);
            }
        }

        let rows = questions
            .iter()
            .map(|question| Self::row(question, answers.get(&question.id), feedback.get(&question.id)))
            .collect();

        AssessmentResult {
            percentage: score_percentage(&response.score_raw),
            score_raw: response.score_raw.clone(),
            rows,
            submitted_at: Utc::now(),
        }
    }

    pub fn page(result: &AssessmentResult, page: usize, per_page: usize) -> Page<ResultRow> {
        paginate(&result.rows, page, per_page)
    }

    fn row(
        question: &Question,
        stored: Option<&String>,
        entry: Option<&&FeedbackEntry>,
    ) -> ResultRow {
        let Some(entry) = entry else {
            return ResultRow {
                question: question.clone(),
                chosen_answer: stored.cloned(),
                correctness: Correctness::Ungraded,
                score: None,
                feedback: String::new(),
            };
        };

        let chosen_answer = stored
            .cloned()
            .or_else(|| entry.user_answer.as_ref().and_then(value_text))
            .map(|answer| Self::as_key(question, answer));
        let correct_answer = entry
            .correct_answer
            .as_ref()
            .and_then(value_text)
            .map(|answer| Self::as_key(question, answer));

        ResultRow {
            question: question.with_correct_answer(correct_answer),
            chosen_answer,
            correctness: Correctness::from_score(entry.score),
            score: Some(entry.score),
            feedback: entry.feedback.clone(),
        }
    }

    /// Choice answers are reported by key even when the backend echoes labels.
    fn as_key(question: &Question, answer: String) -> String {
        match question.resolve_key(&answer) {
            Some(key) => key.to_string(),
            None => answer,
        }
    }
}
