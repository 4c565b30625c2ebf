//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `HuntRepository` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hunt_core::domain::{Answer, NewAnswer, NewPost, NewQuestion, Post, Question};
use hunt_core::ports::{HuntRepository, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `HuntRepository` port.
#[derive(Clone)]
pub struct PgHuntRepository {
    pool: PgPool,
}

impl PgHuntRepository {
    /// Creates a new `PgHuntRepository`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct QuestionRecord {
    id: Uuid,
    level: i32,
    prompt: Vec<String>,
    created_at: DateTime<Utc>,
}
impl QuestionRecord {
    fn to_domain(self) -> Question {
        Question {
            id: self.id,
            // Guarded by the CHECK constraint on the column.
            level: self.level.max(0) as u32,
            prompt: self.prompt,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct AnswerRecord {
    id: Uuid,
    id_question: Uuid,
    variants: Vec<String>,
    next_id_question: Uuid,
}
impl AnswerRecord {
    fn to_domain(self) -> Answer {
        Answer {
            id: self.id,
            id_question: self.id_question,
            variants: self.variants,
            next_id_question: self.next_id_question,
        }
    }
}

#[derive(FromRow)]
struct PostRecord {
    id: Uuid,
    id_questions: Vec<Uuid>,
    source_low_res: String,
    source_high_res: String,
}
impl PostRecord {
    fn to_domain(self) -> Post {
        Post {
            id: self.id,
            id_questions: self.id_questions,
            source_low_res: self.source_low_res,
            source_high_res: self.source_high_res,
        }
    }
}

fn level_param(level: u32) -> PortResult<i32> {
    i32::try_from(level)
        .map_err(|_| PortError::Unexpected(format!("Level {} is out of range", level)))
}

//=========================================================================================
// `HuntRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl HuntRepository for PgHuntRepository {
    async fn get_question_by_id(&self, question_id: Uuid) -> PortResult<Question> {
        let record = sqlx::query_as::<_, QuestionRecord>(
            "SELECT id, level, prompt, created_at FROM questions WHERE id = $1",
        )
        .bind(question_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Question {} not found", question_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn get_question_by_level(&self, level: u32) -> PortResult<Question> {
        let record = sqlx::query_as::<_, QuestionRecord>(
            "SELECT id, level, prompt, created_at \
             FROM questions \
             WHERE level = $1 \
             ORDER BY created_at ASC LIMIT 1",
        )
        .bind(level_param(level)?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("No question at level {}", level))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn list_questions(&self) -> PortResult<Vec<Question>> {
        let records = sqlx::query_as::<_, QuestionRecord>(
            "SELECT id, level, prompt, created_at \
             FROM questions \
             ORDER BY level ASC, created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let questions = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(questions)
    }

    async fn create_question(&self, question: NewQuestion) -> PortResult<Question> {
        let record = sqlx::query_as::<_, QuestionRecord>(
            "INSERT INTO questions (id, level, prompt) \
             VALUES ($1, $2, $3) \
             RETURNING id, level, prompt, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(level_param(question.level)?)
        .bind(question.prompt)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_answers_for_question(&self, question_id: Uuid) -> PortResult<Vec<Answer>> {
        let records = sqlx::query_as::<_, AnswerRecord>(
            "SELECT id, id_question, variants, next_id_question \
             FROM answers \
             WHERE id_question = $1 \
             ORDER BY created_at ASC",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let answers = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(answers)
    }

    async fn create_answer(&self, answer: NewAnswer) -> PortResult<Answer> {
        let record = sqlx::query_as::<_, AnswerRecord>(
            "INSERT INTO answers (id, id_question, variants, next_id_question) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, id_question, variants, next_id_question",
        )
        .bind(Uuid::new_v4())
        .bind(answer.id_question)
        .bind(answer.variants)
        .bind(answer.next_id_question)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_posts_for_question(&self, question_id: Uuid) -> PortResult<Vec<Post>> {
        let records = sqlx::query_as::<_, PostRecord>(
            "SELECT id, id_questions, source_low_res, source_high_res \
             FROM posts \
             WHERE $1 = ANY(id_questions) \
             ORDER BY created_at ASC",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let posts = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(posts)
    }

    async fn create_post(&self, post: NewPost) -> PortResult<Post> {
        let record = sqlx::query_as::<_, PostRecord>(
            "INSERT INTO posts (id, id_questions, source_low_res, source_high_res) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, id_questions, source_low_res, source_high_res",
        )
        .bind(Uuid::new_v4())
        .bind(post.id_questions)
        .bind(post.source_low_res)
        .bind(post.source_high_res)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }
}
