use thiserror::Error;

/// Failure taxonomy for the resolver and its provider adapters.
///
/// `Auth` is matched on by the chain-search loop to stop iterating: a bad
/// credential cannot be fixed by retrying the same provider on another chain.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("{provider} API key is missing")]
    MissingApiKey { provider: &'static str },

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("{0}")]
    Provider(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResolveError {
    /// Classify an upstream error message, promoting credential problems to
    /// `Auth` so the caller can short-circuit.
    pub fn from_upstream(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("api key") || lower.contains("unauthorized") {
            ResolveError::Auth(message)
        } else {
            ResolveError::Provider(message)
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ResolveError::Auth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_key_classified_as_auth() {
        let err = ResolveError::from_upstream("Invalid API Key");
        assert!(err.is_auth());
    }

    #[test]
    fn test_unauthorized_classified_as_auth() {
        let err = ResolveError::from_upstream("Unauthorized request");
        assert!(err.is_auth());
    }

    #[test]
    fn test_other_message_is_provider_error() {
        let err = ResolveError::from_upstream("Max rate limit reached");
        assert!(!err.is_auth());
        assert_eq!(err.to_string(), "Max rate limit reached");
    }
}
