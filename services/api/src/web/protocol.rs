//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server.
//!
//! Every frame is a JSON text message of the form `{"event": "<name>", "data": <payload>}`.
//! Event names and payload field names are the wire contract with the existing client.

use hunt_core::domain::{Post, Question};
use hunt_core::progression::{Advance, Stage};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Asks for the current stage. The payload is the session token, `"0"` or null.
    GetPosts(Option<String>),

    /// Submits an answer for the current stage.
    SendAnswer(AnswerSubmission),

    /// Admin: registers a new question.
    SendQuestion(NewQuestionPayload),

    /// Admin: asks for every registered question.
    GetQuestions,

    /// Admin: registers accepted variants for a question.
    CreateAnswer(NewAnswerPayload),
}

impl ClientMessage {
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            ClientMessage::SendQuestion(_)
                | ClientMessage::GetQuestions
                | ClientMessage::CreateAnswer(_)
        )
    }
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct AnswerSubmission {
    #[serde(default)]
    pub token: Option<String>,
    pub answer: String,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct NewQuestionPayload {
    pub questions: Vec<String>,
    pub level: u32,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAnswerPayload {
    pub variants: Vec<String>,
    pub next_id_question: Uuid,
    pub id_question: Uuid,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// The current stage, in reply to `getPosts`.
    ReceivePosts(StagePayload),

    /// A fresh token and the unlocked stage, in reply to a matching `sendAnswer`.
    ReceiveToken(TokenPayload),

    /// Every registered question, in reply to `getQuestions`.
    ReceiveQuestions(Vec<QuestionView>),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StagePayload {
    pub posts: Vec<PostView>,
    pub question: Option<QuestionView>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TokenPayload {
    pub token: String,
    pub posts: Vec<PostView>,
    pub question: QuestionView,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct QuestionView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub level: u32,
    pub question: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub id_questions: Vec<Uuid>,
    pub source_low_res: String,
    pub source_high_res: String,
}

//=========================================================================================
// Domain Conversions
//=========================================================================================

impl From<Question> for QuestionView {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            level: question.level,
            question: question.prompt,
        }
    }
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            id_questions: post.id_questions,
            source_low_res: post.source_low_res,
            source_high_res: post.source_high_res,
        }
    }
}

impl From<Stage> for StagePayload {
    fn from(stage: Stage) -> Self {
        Self {
            posts: stage.posts.into_iter().map(PostView::from).collect(),
            question: stage.question.map(QuestionView::from),
        }
    }
}

impl From<Advance> for TokenPayload {
    fn from(advance: Advance) -> Self {
        Self {
            token: advance.token,
            posts: advance.posts.into_iter().map(PostView::from).collect(),
            question: advance.question.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_events_use_socket_names() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"getPosts","data":"abc.def.ghi"}"#).unwrap();
        assert_eq!(msg, ClientMessage::GetPosts(Some("abc.def.ghi".into())));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"getPosts","data":null}"#).unwrap();
        assert_eq!(msg, ClientMessage::GetPosts(None));

        let msg: ClientMessage = serde_json::from_str(
            r#"{"event":"sendAnswer","data":{"token":"0","answer":" Paris"}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::SendAnswer(AnswerSubmission {
                token: Some("0".into()),
                answer: " Paris".into(),
            })
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"event":"getQuestions"}"#).unwrap();
        assert_eq!(msg, ClientMessage::GetQuestions);
    }

    #[test]
    fn create_answer_reads_camel_case_ids() {
        let (q, next) = (Uuid::new_v4(), Uuid::new_v4());
        let raw = json!({
            "event": "createAnswer",
            "data": { "variants": ["nile"], "nextIdQuestion": next, "idQuestion": q }
        });
        let msg: ClientMessage = serde_json::from_value(raw).unwrap();
        assert!(msg.requires_admin());
        assert_eq!(
            msg,
            ClientMessage::CreateAnswer(NewAnswerPayload {
                variants: vec!["nile".into()],
                next_id_question: next,
                id_question: q,
            })
        );
    }

    #[test]
    fn unknown_event_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"event":"dropTables"}"#).is_err());
    }

    #[test]
    fn server_events_keep_client_field_names() {
        let (question_id, post_id) = (Uuid::new_v4(), Uuid::new_v4());
        let msg = ServerMessage::ReceiveToken(TokenPayload {
            token: "t".into(),
            posts: vec![PostView {
                id: post_id,
                id_questions: vec![question_id],
                source_low_res: "a_low.jpg".into(),
                source_high_res: "a.jpg".into(),
            }],
            question: QuestionView {
                id: question_id,
                level: 3,
                question: vec!["Where?".into()],
            },
        });

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "receiveToken",
                "data": {
                    "token": "t",
                    "posts": [{
                        "_id": post_id,
                        "idQuestions": [question_id],
                        "sourceLowRes": "a_low.jpg",
                        "sourceHighRes": "a.jpg"
                    }],
                    "question": { "_id": question_id, "level": 3, "question": ["Where?"] }
                }
            })
        );
    }

    #[test]
    fn empty_stage_sends_null_question() {
        let msg = ServerMessage::ReceivePosts(StagePayload { posts: vec![], question: None });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({"event": "receivePosts", "data": {"posts": [], "question": null}})
        );
    }
}
