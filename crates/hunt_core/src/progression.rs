//! crates/hunt_core/src/progression.rs
//!
//! The answer-progression handshake: resolve the player's current question from
//! their session token, match a submitted answer against the accepted variants,
//! and on success hand out a token for the next question together with its posts.
//!
//! Every call is resolved independently against the repository. Nothing here
//! writes to the repository.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{Post, Question, SessionClaims};
use crate::ports::{HuntRepository, PortError, PortResult, SessionTokenService};

/// Token value sent by clients that have not answered anything yet.
pub const NO_SESSION_TOKEN: &str = "0";

/// The level a player without a usable token starts at.
pub const START_LEVEL: u32 = 0;

/// The question a player is currently on, with the posts attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub question: Option<Question>,
    pub posts: Vec<Post>,
}

/// The result of a correct answer: a fresh token and the stage it unlocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub token: String,
    pub question: Question,
    pub posts: Vec<Post>,
}

/// Canonical form used on both sides of an answer comparison.
pub fn normalize_answer(text: &str) -> String {
    text.trim().to_lowercase()
}

/// True when `answer` equals one of `variants`, ignoring case and surrounding whitespace.
pub fn matches_variant<S: AsRef<str>>(answer: &str, variants: &[S]) -> bool {
    let answer = normalize_answer(answer);
    variants
        .iter()
        .any(|variant| normalize_answer(variant.as_ref()) == answer)
}

#[derive(Clone)]
pub struct Progression {
    repo: Arc<dyn HuntRepository>,
    tokens: Arc<dyn SessionTokenService>,
}

impl Progression {
    pub fn new(repo: Arc<dyn HuntRepository>, tokens: Arc<dyn SessionTokenService>) -> Self {
        Self { repo, tokens }
    }

    /// Decodes a client token. Absent, sentinel and invalid tokens all mean
    /// "start of game" and yield `None`.
    pub fn resolve_session(&self, token: Option<&str>) -> Option<SessionClaims> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != NO_SESSION_TOKEN)?;
        self.tokens.verify(token).ok()
    }

    /// Finds the question the token points at. Falls back to the first question
    /// at the token's level if the referenced one is gone, and to level 0 when
    /// there is no usable token.
    pub async fn current_question(&self, token: Option<&str>) -> PortResult<Option<Question>> {
        let level = match self.resolve_session(token) {
            Some(claims) => match self.repo.get_question_by_id(claims.id_question).await {
                Ok(question) => return Ok(Some(question)),
                Err(PortError::NotFound(_)) => claims.level,
                Err(e) => return Err(e),
            },
            None => START_LEVEL,
        };

        match self.repo.get_question_by_level(level).await {
            Ok(question) => Ok(Some(question)),
            Err(PortError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn current_stage(&self, token: Option<&str>) -> PortResult<Stage> {
        let question = self.current_question(token).await?;
        let posts = match &question {
            Some(q) => self.repo.get_posts_for_question(q.id).await?,
            None => Vec::new(),
        };
        Ok(Stage { question, posts })
    }

    /// Checks `answer` against the current question. `Ok(None)` means the answer
    /// did not match (or there is no current question) and nothing should be sent.
    pub async fn submit_answer(
        &self,
        token: Option<&str>,
        answer: &str,
    ) -> PortResult<Option<Advance>> {
        let Some(current) = self.current_question(token).await? else {
            debug!("No question at the resolved stage; ignoring answer.");
            return Ok(None);
        };

        let answers = self.repo.get_answers_for_question(current.id).await?;
        let matched = answers
            .iter()
            .find(|a| matches_variant(answer, a.variants.as_slice()));
        let Some(matched) = matched else {
            info!("Answer for level {} not in variants.", current.level);
            return Ok(None);
        };

        let next = self.repo.get_question_by_id(matched.next_id_question).await?;
        let token = self.tokens.issue(&SessionClaims::for_question(&next))?;
        let posts = self.repo.get_posts_for_question(next.id).await?;

        info!(
            "Matched answer at level {}. Passing to level {}.",
            current.level, next.level
        );
        Ok(Some(Advance {
            token,
            question: next,
            posts,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewAnswer, NewPost, NewQuestion};
    use crate::memory::InMemoryHuntRepository;
    use uuid::Uuid;

    /// Tokens of the form `signed:<level>:<uuid>`.
    struct PlainTokens;

    impl SessionTokenService for PlainTokens {
        fn issue(&self, claims: &SessionClaims) -> PortResult<String> {
            Ok(format!("signed:{}:{}", claims.level, claims.id_question))
        }

        fn verify(&self, token: &str) -> PortResult<SessionClaims> {
            let mut parts = token.split(':');
            if parts.next() != Some("signed") {
                return Err(PortError::Unauthorized);
            }
            let level = parts
                .next()
                .and_then(|l| l.parse().ok())
                .ok_or(PortError::Unauthorized)?;
            let id_question = parts
                .next()
                .and_then(|id| Uuid::parse_str(id).ok())
                .ok_or(PortError::Unauthorized)?;
            Ok(SessionClaims { level, id_question })
        }
    }

    struct Fixture {
        repo: Arc<InMemoryHuntRepository>,
        progression: Progression,
        q0: Question,
        q1: Question,
        q2: Question,
    }

    async fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryHuntRepository::new());
        let q0 = repo
            .create_question(NewQuestion { level: 0, prompt: vec!["Capital of France?".into()] })
            .await
            .unwrap();
        let q1 = repo
            .create_question(NewQuestion { level: 1, prompt: vec!["Longest river?".into()] })
            .await
            .unwrap();
        let q2 = repo
            .create_question(NewQuestion { level: 2, prompt: vec!["The end.".into()] })
            .await
            .unwrap();
        repo.create_answer(NewAnswer {
            id_question: q0.id,
            variants: vec!["paris".into(), "Paris ".into()],
            next_id_question: q1.id,
        })
        .await
        .unwrap();
        repo.create_answer(NewAnswer {
            id_question: q1.id,
            variants: vec!["Nile".into()],
            next_id_question: q2.id,
        })
        .await
        .unwrap();
        repo.create_post(NewPost {
            id_questions: vec![q1.id],
            source_low_res: "nile_low.jpg".into(),
            source_high_res: "nile.jpg".into(),
        })
        .await
        .unwrap();

        let progression = Progression::new(repo.clone(), Arc::new(PlainTokens));
        Fixture { repo, progression, q0, q1, q2 }
    }

    #[test]
    fn matching_ignores_case_and_surrounding_whitespace() {
        assert!(matches_variant(" PARIS", &["paris", "Paris "]));
        assert!(matches_variant("paris\n", &["  PaRiS"]));
        assert!(!matches_variant("pa ris", &["paris"]));
        assert!(!matches_variant("paris", &[] as &[&str]));
    }

    #[test]
    fn sentinel_and_garbage_tokens_start_over() {
        let progression = Progression::new(
            Arc::new(InMemoryHuntRepository::new()),
            Arc::new(PlainTokens),
        );
        assert_eq!(progression.resolve_session(None), None);
        assert_eq!(progression.resolve_session(Some(NO_SESSION_TOKEN)), None);
        assert_eq!(progression.resolve_session(Some("")), None);
        assert_eq!(progression.resolve_session(Some("forged:1:nope")), None);
    }

    #[tokio::test]
    async fn correct_answer_without_token_advances_from_level_zero() {
        let f = fixture().await;

        let advance = f
            .progression
            .submit_answer(None, " PARIS")
            .await
            .unwrap()
            .expect("answer should match");

        assert_eq!(advance.question, f.q1);
        assert_eq!(advance.posts.len(), 1);
        let claims = f.progression.resolve_session(Some(advance.token.as_str())).unwrap();
        assert_eq!(claims, SessionClaims { level: 1, id_question: f.q1.id });
    }

    #[tokio::test]
    async fn token_resolves_back_to_its_question() {
        let f = fixture().await;
        let token = PlainTokens.issue(&SessionClaims::for_question(&f.q1)).unwrap();

        let first = f.progression.current_question(Some(token.as_str())).await.unwrap();
        let second = f.progression.current_question(Some(token.as_str())).await.unwrap();
        assert_eq!(first, Some(f.q1.clone()));
        assert_eq!(first, second);

        let advance = f
            .progression
            .submit_answer(Some(token.as_str()), "nile")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(advance.question, f.q2);
        assert!(advance.posts.is_empty());
    }

    #[tokio::test]
    async fn wrong_answer_is_a_silent_no_op() {
        let f = fixture().await;
        let token = PlainTokens.issue(&SessionClaims::for_question(&f.q1)).unwrap();

        let outcome = f.progression.submit_answer(Some(token.as_str()), "amazon").await.unwrap();
        assert!(outcome.is_none());

        // The level-0 answer is not accepted once the player is on level 1.
        let outcome = f.progression.submit_answer(Some(token.as_str()), "paris").await.unwrap();
        assert!(outcome.is_none());

        assert_eq!(f.repo.list_questions().await.unwrap().len(), 3);
        assert_eq!(f.repo.get_answers_for_question(f.q1.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tampered_token_degrades_to_level_zero() {
        let f = fixture().await;

        let stage = f.progression.current_stage(Some("signed:1:not-a-uuid")).await.unwrap();
        assert_eq!(stage.question, Some(f.q0.clone()));

        let advance = f
            .progression
            .submit_answer(Some("eyJhbGciOiJIUzI1NiJ9.garbage.sig"), "paris")
            .await
            .unwrap();
        assert_eq!(advance.map(|a| a.question), Some(f.q1));
    }

    #[tokio::test]
    async fn stale_question_id_falls_back_to_token_level() {
        let f = fixture().await;
        let stale = SessionClaims { level: 1, id_question: Uuid::new_v4() };
        let token = PlainTokens.issue(&stale).unwrap();

        let stage = f.progression.current_stage(Some(token.as_str())).await.unwrap();
        assert_eq!(stage.question, Some(f.q1));
        assert_eq!(stage.posts.len(), 1);
    }

    #[tokio::test]
    async fn empty_hunt_has_no_stage_and_accepts_nothing() {
        let progression = Progression::new(
            Arc::new(InMemoryHuntRepository::new()),
            Arc::new(PlainTokens),
        );

        let stage = progression.current_stage(None).await.unwrap();
        assert_eq!(stage, Stage { question: None, posts: vec![] });
        assert!(progression.submit_answer(None, "anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dangling_next_question_is_reported() {
        let repo = Arc::new(InMemoryHuntRepository::new());
        let q0 = repo
            .create_question(NewQuestion { level: 0, prompt: vec!["?".into()] })
            .await
            .unwrap();
        repo.create_answer(NewAnswer {
            id_question: q0.id,
            variants: vec!["yes".into()],
            next_id_question: Uuid::new_v4(),
        })
        .await
        .unwrap();
        let progression = Progression::new(repo, Arc::new(PlainTokens));

        let err = progression.submit_answer(None, "yes").await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
