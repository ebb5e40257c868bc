use async_trait::async_trait;
use secrecy::{ExposeSecret as _, SecretString};

use crate::{
    clients::api_client::ApiClient,
    errors::SessionResult,
    models::dto::{request::SaveCredentialRequest, response::CredentialResponse},
};

/// The user's profile on the backend, which holds the API key used for
/// generation and grading.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileClient: Send + Sync {
    async fn get_credential(&self) -> SessionResult<Option<SecretString>>;
    async fn save_credential(&self, value: SecretString) -> SessionResult<()>;
}

pub struct HttpProfileClient {
    api: ApiClient,
}

impl HttpProfileClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ProfileClient for HttpProfileClient {
    async fn get_credential(&self) -> SessionResult<Option<SecretString>> {
        let response: CredentialResponse = self.api.get_json(&["profile", "api-key"]).await?;
        Ok(response
            .api_key
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from))
    }

    async fn save_credential(&self, value: SecretString) -> SessionResult<()> {
        let body = SaveCredentialRequest {
            api_key: value.expose_secret().to_string(),
        };
        self.api.put_json(&["profile", "api-key"], &body).await
    }
}
