use std::sync::Arc;

use reqwest::{RequestBuilder, Url};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::Config,
    errors::{SessionError, SessionResult},
    storage::Storage,
};

/// Shared HTTP plumbing for the backend clients: base URL, timeout and the
/// bearer token kept in storage.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn Storage>,
    token_key: String,
}

impl ApiClient {
    pub fn new(config: &Config, storage: Arc<dyn Storage>) -> SessionResult<Self> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| SessionError::Config(format!("Invalid api_base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SessionError::Config(format!(
                "api_base_url {} cannot hold a path",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url,
            storage,
            token_key: config.token_storage_key.clone(),
        })
    }

    /// Appends `segments` to the base URL. Each segment is percent-encoded,
    /// so ids containing `/` or `?` stay inside their segment.
    pub fn endpoint(&self, segments: &[&str]) -> SessionResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SessionError::Config(format!("{} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> SessionResult<T> {
        let request = self.http.get(self.endpoint(segments)?);
        self.send_json(request).await
    }

    pub async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> SessionResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.endpoint(segments)?).json(body);
        self.send_json(request).await
    }

    pub async fn put_json<B>(&self, segments: &[&str], body: &B) -> SessionResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let request = self.http.put(self.endpoint(segments)?).json(body);
        self.send(request).await?;
        Ok(())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> SessionResult<T> {
        let response = self.send(request).await?;
        let body = response.json::<T>().await?;
        Ok(body)
    }

    async fn send(&self, request: RequestBuilder) -> SessionResult<reqwest::Response> {
        let request = match self.token().await? {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            log::error!("Request to backend failed: {}", e);
            SessionError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read response body".to_string());
        log::error!("Backend {} responded {}: {}", url, status, body);
        Err(SessionError::Transport(format!(
            "{} responded with status {}",
            url, status
        )))
    }

    async fn token(&self) -> SessionResult<Option<SecretString>> {
        let token = self.storage.get(&self.token_key).await?;
        Ok(token.filter(|t| !t.is_empty()).map(SecretString::from))
    }
}
