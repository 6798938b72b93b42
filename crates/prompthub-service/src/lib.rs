mod blocking;
mod http;
pub mod store;
pub mod submission;
mod traits;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use blocking::BlockingHttpService;
pub use http::HttpService;
pub use store::{FetchError, PollConfig, PromptStore, SubscriptionId};
pub use submission::SubmissionError;
pub use traits::{PromptService, ServiceError};
