use prompthub_core::catalog::Catalog;
use prompthub_core::error::ValidationError;
use prompthub_core::request::RequestDraft;
use thiserror::Error;
use tracing::{info, warn};

use crate::{PromptService, ServiceError};

pub const SUBMITTED_MESSAGE: &str = "Your prompt request has been submitted. You will be \
     notified at the email address you provided; if approved, the prompt will appear shortly.";

pub const FAILED_MESSAGE: &str = "Failed to submit prompt request. Please try again.";

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("prompt request failed: {0}")]
    Service(#[from] ServiceError),
}

impl SubmissionError {
    /// What the form shows. Validation problems are specific; anything that
    /// went wrong on the wire gets one generic notice.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Invalid(e) => e.to_string(),
            SubmissionError::Service(_) => FAILED_MESSAGE.to_string(),
        }
    }
}

/// Validate `draft` against `catalog`, then send it as a single POST.
/// Nothing is sent when validation fails. The catalog is not touched; an
/// approved prompt shows up through a later poll.
pub async fn submit(
    service: &dyn PromptService,
    catalog: &Catalog,
    draft: &RequestDraft,
) -> Result<(), SubmissionError> {
    let request = draft.validate(catalog)?;
    match service.submit_request(&request).await {
        Ok(()) => {
            info!(prompt = %request.prompt_name, "prompt request submitted");
            Ok(())
        }
        Err(e) => {
            warn!(prompt = %request.prompt_name, "error submitting prompt request: {e}");
            Err(e.into())
        }
    }
}
