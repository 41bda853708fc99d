use thiserror::Error;

/// Longest slice of a raw response body kept inside an error.
const MAX_BODY_SNIPPET: usize = 500;

#[derive(Error, Debug)]
pub enum SubtransError {
    #[error("Remote call failed ({status}): {body}")]
    RemoteCallFailed { status: u16, body: String },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The request URL carries the API key, so it is stripped before the error
/// can be displayed or logged.
impl From<reqwest::Error> for SubtransError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

/// Structural problems with a `generateContent` response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("response body is not valid JSON: {body}")]
    InvalidEnvelope { body: String },

    #[error("response has no candidates: {body}")]
    NoCandidates { body: String },

    #[error("first candidate has no content parts: {body}")]
    MalformedContent { body: String },

    #[error("model returned empty text: {body}")]
    EmptyResponseText { body: String },

    #[error("model output is not a translations object or array: {body}")]
    UnexpectedShape { body: String },
}

impl ProtocolError {
    pub fn invalid_envelope(body: &str) -> Self {
        Self::InvalidEnvelope { body: snippet(body) }
    }

    pub fn no_candidates(body: &str) -> Self {
        Self::NoCandidates { body: snippet(body) }
    }

    pub fn malformed_content(body: &str) -> Self {
        Self::MalformedContent { body: snippet(body) }
    }

    pub fn empty_response_text(body: &str) -> Self {
        Self::EmptyResponseText { body: snippet(body) }
    }

    pub fn unexpected_shape(body: &str) -> Self {
        Self::UnexpectedShape { body: snippet(body) }
    }
}

/// Truncate on a char boundary so multi-byte text never splits.
pub(crate) fn snippet(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_SNIPPET) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, SubtransError>;
