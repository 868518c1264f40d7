use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("question source error: {0}")]
    Source(#[from] SourceError),
    #[error("session not ready: {0}")]
    NotReady(&'static str),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("rate limit exceeded")]
    RateLimit,
    #[error("authentication failed")]
    Authentication,
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] ParseError),
    #[error("normalization failed: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("retry attempts exhausted")]
    Exhausted,
}

/// Failures while parsing a free-text or embedded-JSON question payload.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("missing marker: {0}")]
    MissingMarker(&'static str),
    #[error("marker appears more than once: {0}")]
    DuplicateMarker(&'static str),
    #[error("expected 4 option lines, found {0}")]
    OptionCount(usize),
    #[error("no JSON object found in response text")]
    NoJsonObject,
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures while assembling a `Question` from loosely structured parts.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("correct answer {0:?} does not match any option")]
    AnswerNotFound(String),
    #[error("expected exactly 4 options, got {0}")]
    OptionCount(usize),
    #[error("options are not pairwise distinct")]
    DuplicateOptions,
    #[error("correct index {0} out of range")]
    IndexOutOfRange(usize),
}
