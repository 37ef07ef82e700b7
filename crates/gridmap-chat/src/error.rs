//! Error types for the station assistant.

/// Errors from the chat engine.
///
/// Provider and transport failures never leave the resolver: they are
/// logged and replaced by a fixed reply. The remaining variants are
/// surfaced by [`crate::session::ChatSession::submit`].
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("a query is already being resolved")]
    Busy,
    #[error("provider error: {0}")]
    Provider(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("state error: {0}")]
    State(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        assert_eq!(
            ChatError::Busy.to_string(),
            "a query is already being resolved"
        );
        assert_eq!(
            ChatError::Provider("HTTP 500".to_string()).to_string(),
            "provider error: HTTP 500"
        );
        assert_eq!(
            ChatError::Transport("timed out".to_string()).to_string(),
            "transport error: timed out"
        );
        assert_eq!(
            ChatError::State("lock poisoned".to_string()).to_string(),
            "state error: lock poisoned"
        );
    }

    #[test]
    fn test_errors_implement_debug() {
        let dbg = format!("{:?}", ChatError::Busy);
        assert!(dbg.contains("Busy"));
        let dbg = format!("{:?}", ChatError::MessageTooLong(10));
        assert!(dbg.contains("MessageTooLong"));
    }
}
