//! crates/hunt_core/src/memory.rs
//!
//! An in-process implementation of `HuntRepository`, used for local runs without
//! a database and as the backing store in tests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Answer, NewAnswer, NewPost, NewQuestion, Post, Question};
use crate::ports::{HuntRepository, PortError, PortResult};

#[derive(Default)]
struct Tables {
    questions: Vec<Question>,
    answers: Vec<Answer>,
    posts: Vec<Post>,
}

/// Rows are kept in insertion order, so "oldest first" falls out of a linear scan.
#[derive(Default)]
pub struct InMemoryHuntRepository {
    tables: RwLock<Tables>,
}

impl InMemoryHuntRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HuntRepository for InMemoryHuntRepository {
    async fn get_question_by_id(&self, question_id: Uuid) -> PortResult<Question> {
        let tables = self.tables.read().await;
        tables
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Question {} not found", question_id)))
    }

    async fn get_question_by_level(&self, level: u32) -> PortResult<Question> {
        let tables = self.tables.read().await;
        tables
            .questions
            .iter()
            .find(|q| q.level == level)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("No question at level {}", level)))
    }

    async fn list_questions(&self) -> PortResult<Vec<Question>> {
        Ok(self.tables.read().await.questions.clone())
    }

    async fn create_question(&self, question: NewQuestion) -> PortResult<Question> {
        let record = Question {
            id: Uuid::new_v4(),
            level: question.level,
            prompt: question.prompt,
            created_at: Utc::now(),
        };
        self.tables.write().await.questions.push(record.clone());
        Ok(record)
    }

    async fn get_answers_for_question(&self, question_id: Uuid) -> PortResult<Vec<Answer>> {
        let tables = self.tables.read().await;
        Ok(tables
            .answers
            .iter()
            .filter(|a| a.id_question == question_id)
            .cloned()
            .collect())
    }

    async fn create_answer(&self, answer: NewAnswer) -> PortResult<Answer> {
        let record = Answer {
            id: Uuid::new_v4(),
            id_question: answer.id_question,
            variants: answer.variants,
            next_id_question: answer.next_id_question,
        };
        self.tables.write().await.answers.push(record.clone());
        Ok(record)
    }

    async fn get_posts_for_question(&self, question_id: Uuid) -> PortResult<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .filter(|p| p.id_questions.contains(&question_id))
            .cloned()
            .collect())
    }

    async fn create_post(&self, post: NewPost) -> PortResult<Post> {
        let record = Post {
            id: Uuid::new_v4(),
            id_questions: post.id_questions,
            source_low_res: post.source_low_res,
            source_high_res: post.source_high_res,
        };
        self.tables.write().await.posts.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn level_lookup_returns_oldest_question() {
        let repo = InMemoryHuntRepository::new();
        let first = repo
            .create_question(NewQuestion { level: 2, prompt: vec!["first".into()] })
            .await
            .unwrap();
        repo.create_question(NewQuestion { level: 2, prompt: vec!["second".into()] })
            .await
            .unwrap();

        let found = repo.get_question_by_level(2).await.unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn missing_question_is_not_found() {
        let repo = InMemoryHuntRepository::new();
        let err = repo.get_question_by_level(0).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn posts_are_shared_between_questions() {
        let repo = InMemoryHuntRepository::new();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        repo.create_post(NewPost {
            id_questions: vec![a, b],
            source_low_res: "map_low.jpg".into(),
            source_high_res: "map.jpg".into(),
        })
        .await
        .unwrap();

        assert_eq!(repo.get_posts_for_question(a).await.unwrap().len(), 1);
        assert_eq!(repo.get_posts_for_question(b).await.unwrap().len(), 1);
        assert!(repo.get_posts_for_question(c).await.unwrap().is_empty());
    }
}
