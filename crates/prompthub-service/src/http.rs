use async_trait::async_trait;
use prompthub_core::prompt::{decode_prompts, Prompt};
use prompthub_core::request::PromptRequest;
use reqwest::{Client, StatusCode};

use crate::{PromptService, ServiceError};

/// Async HTTP client for the remote prompt API.
pub struct HttpService {
    base_url: String,
    client: Client,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_text(&self, path: &str) -> Result<String, ServiceError> {
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Connection(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            resp.text()
                .await
                .map_err(|e| ServiceError::Decode(format!("read body: {e}")))
        } else {
            Err(parse_error_with_status(status, resp).await)
        }
    }

    async fn post_json<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<(), ServiceError> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::Connection(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(parse_error_with_status(status, resp).await)
        }
    }
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or(body);

    ServiceError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl PromptService for HttpService {
    async fn list_prompts(&self) -> Result<Vec<Prompt>, ServiceError> {
        let body = self.get_text("/prompts").await?;
        decode_prompts(&body).map_err(|e| ServiceError::Decode(format!("json decode: {e}")))
    }

    async fn submit_request(&self, request: &PromptRequest) -> Result<(), ServiceError> {
        self.post_json("/prompts/request", request).await
    }
}
