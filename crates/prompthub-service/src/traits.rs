use async_trait::async_trait;
use prompthub_core::prompt::Prompt;
use prompthub_core::request::PromptRequest;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),
}

/// Operations the remote prompt API offers.
///
/// `HttpService` talks to the real API. The poller and the submission flow
/// only see this trait, so tests can hand them an in-memory double.
#[async_trait]
pub trait PromptService: Send + Sync {
    /// `GET /prompts`, normalized.
    async fn list_prompts(&self) -> Result<Vec<Prompt>, ServiceError>;

    /// `POST /prompts/request`.
    async fn submit_request(&self, request: &PromptRequest) -> Result<(), ServiceError>;
}
