//! crates/hunt_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the hunt's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete database and token-signing implementations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Answer, NewAnswer, NewPost, NewQuestion, Post, Question, SessionClaims};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, signing).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait HuntRepository: Send + Sync {
    // --- Questions ---
    async fn get_question_by_id(&self, question_id: Uuid) -> PortResult<Question>;

    /// Returns the oldest question registered at `level`.
    async fn get_question_by_level(&self, level: u32) -> PortResult<Question>;

    async fn list_questions(&self) -> PortResult<Vec<Question>>;

    async fn create_question(&self, question: NewQuestion) -> PortResult<Question>;

    // --- Answers ---
    async fn get_answers_for_question(&self, question_id: Uuid) -> PortResult<Vec<Answer>>;

    async fn create_answer(&self, answer: NewAnswer) -> PortResult<Answer>;

    // --- Posts ---
    async fn get_posts_for_question(&self, question_id: Uuid) -> PortResult<Vec<Post>>;

    async fn create_post(&self, post: NewPost) -> PortResult<Post>;
}

/// Signs and verifies the opaque session tokens held by players.
pub trait SessionTokenService: Send + Sync {
    fn issue(&self, claims: &SessionClaims) -> PortResult<String>;

    /// Fails with `PortError::Unauthorized` for any token that was not issued by `issue`.
    fn verify(&self, token: &str) -> PortResult<SessionClaims>;
}
