use std::future::Future;
use std::io;
use std::sync::Arc;

use prompthub_core::catalog::Catalog;
use prompthub_core::prompt::Prompt;
use prompthub_core::request::{PromptRequest, RequestDraft};
use tokio::runtime::{Handle, Runtime};

use crate::store::PromptStore;
use crate::submission::{self, SubmissionError};
use crate::{HttpService, PromptService, ServiceError};

/// Blocking wrapper around the async `HttpService`.
///
/// Owns a tokio runtime and uses `block_on()` for each call. The same
/// runtime hosts the poll loop of any store built with `store()`.
/// Designed for sync callers like the TUI.
pub struct BlockingHttpService {
    inner: Arc<HttpService>,
    rt: Runtime,
}

impl BlockingHttpService {
    pub fn new(base_url: &str) -> io::Result<Self> {
        Ok(Self {
            inner: Arc::new(HttpService::new(base_url)),
            rt: Runtime::new()?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    pub fn handle(&self) -> &Handle {
        self.rt.handle()
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.rt.block_on(future)
    }

    /// A store fetching through this service. Not started.
    pub fn store(&self) -> PromptStore {
        PromptStore::new(self.inner.clone())
    }

    pub fn list_prompts(&self) -> Result<Vec<Prompt>, ServiceError> {
        self.rt.block_on(self.inner.list_prompts())
    }

    pub fn submit_request(&self, request: &PromptRequest) -> Result<(), ServiceError> {
        self.rt.block_on(self.inner.submit_request(request))
    }

    pub fn submit(&self, catalog: &Catalog, draft: &RequestDraft) -> Result<(), SubmissionError> {
        self.rt
            .block_on(submission::submit(self.inner.as_ref(), catalog, draft))
    }
}
