#[cfg(test)]
pub mod fixtures {
    use serde_json::json;

    use crate::models::dto::response::{QuestionSetResponse, SubmitAnswersResponse};

    /// A choice question (`1`) followed by a free-text question (`2`).
    pub fn two_question_set() -> QuestionSetResponse {
        serde_json::from_value(json!({
            "questions": [
                {"id": 1, "text": "Pick one", "options": ["A", "B"]},
                {"id": 2, "text": "Explain", "type": "long_answer"}
            ]
        }))
        .expect("fixture question set should deserialize")
    }

    /// Grading for `two_question_set` with only the first question answered.
    pub fn half_graded() -> SubmitAnswersResponse {
        serde_json::from_value(json!({
            "score": "1/2",
            "feedback": [{"id": 1, "score": 1, "correct_answer": "A", "feedback": "ok"}]
        }))
        .expect("fixture response should deserialize")
    }
}

#[cfg(test)]
pub mod test_helpers {
    /// Routes `log` output through the test harness. Safe to call repeatedly.
    pub fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixtures_two_question_set() {
        let set = two_question_set();
        assert_eq!(set.questions.len(), 2);
        assert!(set.time_limit_minutes.is_none());
    }

    #[test]
    fn test_fixtures_half_graded() {
        let response = half_graded();
        assert_eq!(response.feedback.len(), 1);
    }
}
