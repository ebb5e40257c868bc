use std::collections::BTreeMap;

use serde::Serialize;
use validator::Validate;

use crate::models::domain::question::QuestionId;

#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchQuestionsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Body of the submit call. Unanswered questions are absent from `answers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitAnswersRequest {
    pub answers: BTreeMap<QuestionId, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct SaveCredentialRequest {
    #[validate(length(min = 1, max = 512))]
    pub api_key: String,
}
