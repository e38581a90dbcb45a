use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::Value;

use crate::api::models::{CompletionRequest, CompletionResponse};
use crate::error::ChatError;
use crate::register::SignUpForm;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Something that turns one user text into one reply text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, text: &str) -> Result<String, ChatError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub http: HttpClient,
    completion_url: String,
    model: String,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(completion_url: &str, model: &str, api_key: Option<String>) -> Result<Self, ChatError> {
        let http = HttpClient::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            http,
            completion_url: completion_url.to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    pub fn from_settings(settings: &crate::app::Settings) -> Result<Self, ChatError> {
        Self::new(&settings.completion_url, &settings.model, settings.resolved_api_key())
    }

    fn with_auth(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(key) = self.api_key.as_deref() {
            req = req.header("Authorization", format!("Bearer {}", key));
        }
        req
    }

    /// Posts `request` as-is and returns the raw JSON body. Non-2xx statuses
    /// are errors.
    pub async fn send<T>(&self, request: &T) -> Result<Value, ChatError>
    where
        T: Serialize + ?Sized,
    {
        let req = self.with_auth(self.http.post(&self.completion_url)).json(request);
        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(ChatError::Status(resp.status().as_u16()));
        }
        Ok(resp.json::<Value>().await?)
    }

    /// Submits the sign-up form to the registration handler and returns its
    /// plain-text answer.
    pub async fn register(&self, register_url: &str, form: &SignUpForm) -> Result<String, ChatError> {
        let resp = self.http.post(register_url).form(form).send().await?;
        if !resp.status().is_success() {
            return Err(ChatError::Status(resp.status().as_u16()));
        }
        Ok(resp.text().await?.trim().to_string())
    }
}

#[async_trait]
impl CompletionService for ApiClient {
    async fn complete(&self, text: &str) -> Result<String, ChatError> {
        let request = CompletionRequest::single_turn(&self.model, text);
        let json = self.send(&request).await?;
        let parsed: CompletionResponse =
            serde_json::from_value(json).map_err(|e| ChatError::Malformed(e.to_string()))?;
        parsed
            .into_reply()
            .ok_or_else(|| ChatError::Malformed("no choices in response".into()))
    }
}
