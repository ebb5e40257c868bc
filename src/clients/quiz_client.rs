use async_trait::async_trait;
use secrecy::{ExposeSecret as _, SecretString};

use crate::{
    clients::api_client::ApiClient,
    errors::SessionResult,
    models::dto::{
        request::{FetchQuestionsRequest, SubmitAnswersRequest},
        response::{QuestionSetResponse, SubmitAnswersResponse},
    },
};

/// Question generation and grading, both performed by the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizClient: Send + Sync {
    /// May take a long time when questions are generated on demand.
    async fn fetch_questions(
        &self,
        attempt_id: &str,
        credential: Option<SecretString>,
    ) -> SessionResult<QuestionSetResponse>;

    async fn submit_answers(
        &self,
        attempt_id: &str,
        request: SubmitAnswersRequest,
    ) -> SessionResult<SubmitAnswersResponse>;
}

pub struct HttpQuizClient {
    api: ApiClient,
}

impl HttpQuizClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl QuizClient for HttpQuizClient {
    async fn fetch_questions(
        &self,
        attempt_id: &str,
        credential: Option<SecretString>,
    ) -> SessionResult<QuestionSetResponse> {
        log::info!("Fetching questions for attempt {}", attempt_id);
        let body = FetchQuestionsRequest {
            api_key: credential.map(|c| c.expose_secret().to_string()),
        };
        self.api
            .post_json(&["attempts", attempt_id, "questions"], &body)
            .await
    }

    async fn submit_answers(
        &self,
        attempt_id: &str,
        request: SubmitAnswersRequest,
    ) -> SessionResult<SubmitAnswersResponse> {
        log::info!(
            "Submitting {} answers for attempt {}",
            request.answers.len(),
            attempt_id
        );
        self.api
            .post_json(&["attempts", attempt_id, "submit"], &request)
            .await
    }
}
