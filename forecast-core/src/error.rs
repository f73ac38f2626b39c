//! Failure taxonomy for one refresh cycle.
//!
//! Every variant is resolved at the orchestrator boundary and turned into
//! exactly one user-visible message via [`RefreshError::user_message`].

use thiserror::Error;

pub const TRANSPORT_ERROR_PREFIX: &str = "Failed to fetch weather data: ";
pub const FORMAT_ERROR_MESSAGE: &str = "Failed to retrieve weather data.";
pub const SEMANTIC_ERROR_MESSAGE: &str = "The weather service returned an error.";
pub const NO_CITY_PROMPT: &str = "Please add a city.";

/// Network, connection, timeout or non-success HTTP outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{cause}")]
pub struct TransportError {
    cause: String,
}

impl TransportError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self { cause: cause.into() }
    }

    pub fn cause(&self) -> &str {
        &self.cause
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest's Display omits the underlying io/hyper cause.
        let mut cause = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            cause.push_str(": ");
            cause.push_str(&inner.to_string());
            source = std::error::Error::source(inner);
        }
        Self { cause }
    }
}

/// Response bytes do not match the expected structural schema.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("malformed forecast payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("API returned non-OK status '{status}'")]
    Semantic { status: String },
}

impl RefreshError {
    /// Message shown to the user; distinguishes the failure class.
    pub fn user_message(&self) -> String {
        match self {
            RefreshError::Transport(err) => format!("{TRANSPORT_ERROR_PREFIX}{}", err.cause()),
            RefreshError::Format(_) => FORMAT_ERROR_MESSAGE.to_string(),
            RefreshError::Semantic { .. } => SEMANTIC_ERROR_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_appends_cause() {
        let err = RefreshError::from(TransportError::new("connection refused"));
        assert_eq!(err.user_message(), "Failed to fetch weather data: connection refused");
    }

    #[test]
    fn format_message_hides_parse_detail() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = RefreshError::from(FormatError::from(json_err));

        assert_eq!(err.user_message(), FORMAT_ERROR_MESSAGE);
        assert!(err.to_string().contains("malformed forecast payload"));
    }

    #[test]
    fn semantic_message_is_distinct() {
        let err = RefreshError::Semantic { status: "FAIL".into() };

        assert_eq!(err.user_message(), SEMANTIC_ERROR_MESSAGE);
        assert!(err.to_string().contains("non-OK status 'FAIL'"));
    }
}
