//! Text-generation session
//!
//! A session is a single-owner conversation with the generation backend.
//! Callers hand one to the builder and the engine; the engine resets it once
//! at the start of every plan run so runs never share history.

use async_trait::async_trait;

/// Generation backend failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// No backend is reachable or configured
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with an error
    #[error("generation request failed: {0}")]
    Failed(String),

    /// The backend answered with nothing
    #[error("empty response from generation backend")]
    EmptyResponse,
}

/// Conversation with a text-generation backend
#[async_trait]
pub trait GenerationSession: Send {
    /// Send a prompt, returning the reply text
    async fn send_message(&mut self, prompt: &str) -> Result<String, GenerationError>;

    /// Drop all conversational history
    fn reset(&mut self);
}

/// Session for runs without a generation backend
///
/// Every request fails, so write steps must carry their own content.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSession;

#[async_trait]
impl GenerationSession for OfflineSession {
    async fn send_message(&mut self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable(
            "no generation backend configured".to_string(),
        ))
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_session_refuses_requests() {
        let mut session = OfflineSession;
        session.reset();
        let err = session.send_message("hello").await.unwrap_err();
        assert!(matches!(err, GenerationError::Unavailable(_)));
    }
}
