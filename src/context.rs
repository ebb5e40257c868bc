use std::sync::Arc;

use validator::Validate;

use crate::{
    clients::{ApiClient, HttpProfileClient, HttpQuizClient, ProfileClient, QuizClient},
    config::Config,
    errors::SessionResult,
    services::{credential_service::CredentialService, prompt::SubmitPrompt},
    storage::Storage,
};

/// Everything a quiz screen needs from its surroundings, passed in
/// explicitly rather than read from globals.
#[derive(Clone)]
pub struct SessionContext {
    pub config: Arc<Config>,
    pub quiz_client: Arc<dyn QuizClient>,
    pub credentials: Arc<CredentialService>,
    pub storage: Arc<dyn Storage>,
    pub prompt: Arc<dyn SubmitPrompt>,
}

impl SessionContext {
    pub fn new(
        config: Config,
        quiz_client: Arc<dyn QuizClient>,
        profile_client: Arc<dyn ProfileClient>,
        storage: Arc<dyn Storage>,
        prompt: Arc<dyn SubmitPrompt>,
    ) -> Self {
        let credentials = Arc::new(CredentialService::new(
            profile_client,
            storage.clone(),
            config.credential_storage_key.clone(),
        ));

        Self {
            config: Arc::new(config),
            quiz_client,
            credentials,
            storage,
            prompt,
        }
    }

    /// Context wired to the HTTP backend described by `config`.
    pub fn http(
        config: Config,
        storage: Arc<dyn Storage>,
        prompt: Arc<dyn SubmitPrompt>,
    ) -> SessionResult<Self> {
        config.validate()?;

        let quiz_client = Arc::new(HttpQuizClient::new(ApiClient::new(&config, storage.clone())?));
        let profile_client =
            Arc::new(HttpProfileClient::new(ApiClient::new(&config, storage.clone())?));

        Ok(Self::new(config, quiz_client, profile_client, storage, prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::prompt::FixedAnswerPrompt;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_context_is_cloneable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<SessionContext>();
    }

    #[test]
    fn http_context_rejects_invalid_config() {
        let mut config = Config::test_config();
        config.api_base_url = "nowhere".to_string();

        let result = SessionContext::http(
            config,
            Arc::new(MemoryStorage::new()),
            Arc::new(FixedAnswerPrompt(true)),
        );

        assert!(result.is_err());
    }

    #[test]
    fn http_context_builds_from_valid_config() {
        let context = SessionContext::http(
            Config::test_config(),
            Arc::new(MemoryStorage::new()),
            Arc::new(FixedAnswerPrompt(true)),
        )
        .expect("context should build");

        assert_eq!(context.config.credential_storage_key, "api_key");
    }
}
