use thiserror::Error;

/// Failures surfaced by [`parse`](crate::parse).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// The document has no `<OFX>` element to split the header from the body.
    #[error("no `<OFX>` element found in document")]
    MalformedDocument,
    /// The body could not be parsed into a tree, even after normalization.
    #[error("malformed markup:\n{0}")]
    MalformedMarkup(String),
    /// A required element is missing. Holds the full path that was looked up.
    #[error("required field `{0}` not found")]
    FieldNotFound(String),
    #[error("malformed date `{0}`")]
    MalformedDate(String),
    #[error("malformed amount `{0}`")]
    MalformedAmount(String),
}

pub type Result<T> = std::result::Result<T, Error>;
