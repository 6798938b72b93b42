pub mod catalog;
pub mod error;
pub mod filter;
pub mod prompt;
pub mod request;
pub mod selection;

pub use catalog::Catalog;
pub use error::{LookupError, ValidationError};
pub use filter::{PromptFilter, TagFilter};
pub use prompt::{Prompt, RawPrompt};
pub use request::{Institution, PromptRequest, RequestDraft};
pub use selection::{History, Overlay, Selection};
