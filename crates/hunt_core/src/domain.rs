//! crates/hunt_core/src/domain.rs
//!
//! Defines the pure, core data structures of the treasure hunt.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A stage of the hunt. Several prompt lines may be shown for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: Uuid,
    pub level: u32,
    pub prompt: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// The accepted variants for a question, and where a correct answer leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub id: Uuid,
    pub id_question: Uuid,
    pub variants: Vec<String>,
    pub next_id_question: Uuid,
}

/// An uploaded image pair shown alongside one or more questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: Uuid,
    pub id_questions: Vec<Uuid>,
    pub source_low_res: String,
    pub source_high_res: String,
}

// Write-side payloads. Ids and timestamps are assigned by the repository.

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub level: u32,
    pub prompt: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub id_question: Uuid,
    pub variants: Vec<String>,
    pub next_id_question: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub id_questions: Vec<Uuid>,
    pub source_low_res: String,
    pub source_high_res: String,
}

/// The contents of a session token. This is the whole of a player's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClaims {
    pub level: u32,
    pub id_question: Uuid,
}

impl SessionClaims {
    pub fn for_question(question: &Question) -> Self {
        Self {
            level: question.level,
            id_question: question.id,
        }
    }
}
