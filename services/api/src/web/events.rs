//! services/api/src/web/events.rs
//!
//! Turns one decoded client event into at most one reply for the same connection.
//! Nothing here touches the socket, so the socket loop stays a thin shell around it.

use crate::web::{
    protocol::{ClientMessage, QuestionView, ServerMessage},
    state::{AppState, ConnectionState},
};
use hunt_core::domain::{NewAnswer, NewQuestion};
use hunt_core::ports::PortResult;
use tracing::{info, warn};

/// Handles a single client event. `Ok(None)` means nothing is sent back, which is
/// also the outcome of a wrong answer.
pub async fn handle_client_message(
    app_state: &AppState,
    connection: &ConnectionState,
    message: ClientMessage,
) -> PortResult<Option<ServerMessage>> {
    if message.requires_admin() && !connection.is_admin() {
        warn!(
            "Connection {} sent an admin event without admin access; ignoring.",
            connection.connection_id
        );
        return Ok(None);
    }

    match message {
        ClientMessage::GetPosts(token) => {
            let stage = app_state.progression().current_stage(token.as_deref()).await?;
            Ok(Some(ServerMessage::ReceivePosts(stage.into())))
        }
        ClientMessage::SendAnswer(submission) => {
            let advance = app_state
                .progression()
                .submit_answer(submission.token.as_deref(), &submission.answer)
                .await?;
            Ok(advance.map(|a| ServerMessage::ReceiveToken(a.into())))
        }
        ClientMessage::SendQuestion(payload) => {
            let question = app_state
                .repo
                .create_question(NewQuestion {
                    level: payload.level,
                    prompt: payload.questions,
                })
                .await?;
            info!("Question {} created at level {}.", question.id, question.level);
            Ok(None)
        }
        ClientMessage::GetQuestions => {
            let questions = app_state.repo.list_questions().await?;
            Ok(Some(ServerMessage::ReceiveQuestions(
                questions.into_iter().map(QuestionView::from).collect(),
            )))
        }
        ClientMessage::CreateAnswer(payload) => {
            let answer = app_state
                .repo
                .create_answer(NewAnswer {
                    id_question: payload.id_question,
                    variants: payload.variants,
                    next_id_question: payload.next_id_question,
                })
                .await?;
            info!(
                "Answer {} created: {} -> {} ({} variants).",
                answer.id,
                answer.id_question,
                answer.next_id_question,
                answer.variants.len()
            );
            Ok(None)
        }
    }
}
