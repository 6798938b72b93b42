use thiserror::Error;

/// A draft was rejected locally, before any request was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("please enter a valid email address")]
    InvalidEmail,

    #[error("a prompt named \"{0}\" already exists, please choose a different name")]
    DuplicateTitle(String),
}

/// A location referenced a prompt id that the loaded catalog does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("prompt with id {id} not found")]
pub struct LookupError {
    pub id: String,
}
