use thiserror::Error;

/// Terminal failure of a single turn.
///
/// The `Display` text is what the system-error turn shows in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    /// The endpoint answered with a non-success HTTP status.
    #[error("Error {status}: {body}")]
    Endpoint { status: u16, body: String },

    /// The request never produced an HTTP status.
    #[error("Network error: {0}")]
    Transport(String),

    /// Success status, but the body was not a JSON object.
    #[error("Invalid reply from server: {0}")]
    MalformedReply(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_error_contains_status_and_body() {
        let err = TurnError::Endpoint {
            status: 500,
            body: "internal error".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("500"));
        assert!(text.contains("internal error"));
    }

    #[test]
    fn test_transport_error_embeds_description() {
        let err = TurnError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }
}
