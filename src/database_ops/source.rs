use crate::util::http::FetchError;

/// The upstream answered, but not with what the adapter expects.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("response has no entry for `{0}`")]
    MissingKey(String),
    #[error("upstream reported success=false for `{0}`")]
    Unsuccessful(String),
    #[error("response does not match the expected schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Anything that keeps a source adapter from producing typed records.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
