use std::sync::Arc;

use secrecy::{ExposeSecret as _, SecretString};
use validator::Validate;

use crate::{
    clients::ProfileClient,
    errors::{SessionError, SessionResult},
    models::dto::request::SaveCredentialRequest,
    storage::Storage,
};

/// Looks up the user's API key: local storage first, then the profile.
pub struct CredentialService {
    profile: Arc<dyn ProfileClient>,
    storage: Arc<dyn Storage>,
    storage_key: String,
}

impl CredentialService {
    pub fn new(
        profile: Arc<dyn ProfileClient>,
        storage: Arc<dyn Storage>,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            profile,
            storage,
            storage_key: storage_key.into(),
        }
    }

    pub async fn get_credential(&self) -> SessionResult<Option<SecretString>> {
        if let Some(cached) = self.storage.get(&self.storage_key).await? {
            if !cached.trim().is_empty() {
                return Ok(Some(SecretString::from(cached)));
            }
        }

        let credential = self.profile.get_credential().await?;
        if let Some(value) = &credential {
            self.storage
                .set(&self.storage_key, value.expose_secret())
                .await?;
        }
        Ok(credential)
    }

    /// The credential, or `MissingCredential` so the host prompts for one.
    pub async fn require_credential(&self) -> SessionResult<SecretString> {
        match self.get_credential().await {
            Ok(Some(credential)) => Ok(credential),
            Ok(None) => Err(SessionError::MissingCredential),
            Err(err) => {
                log::warn!("Credential lookup failed, asking the user instead: {}", err);
                Err(SessionError::MissingCredential)
            }
        }
    }

    pub async fn save_credential(&self, value: &str) -> SessionResult<()> {
        let value = value.trim();
        let request = SaveCredentialRequest {
            api_key: value.to_string(),
        };
        request
            .validate()
            .map_err(|_| SessionError::MissingCredential)?;

        self.profile
            .save_credential(SecretString::from(request.api_key.clone()))
            .await?;
        self.storage.set(&self.storage_key, &request.api_key).await?;
        log::info!("API key saved to profile");
        Ok(())
    }
}
