//! services/api/src/web/ws_handler.rs
//!
//! This is the entry point and read loop for a WebSocket connection. Each frame is
//! handled to completion before the next one is read.

use crate::{
    error::ApiError,
    web::{
        events::handle_client_message,
        protocol::{ClientMessage, ServerMessage},
        state::{AppState, ConnectionRole, ConnectionState},
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The handler for upgrading player HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, ConnectionRole::Player))
}

/// Same as `ws_handler`, mounted behind the admin middleware.
pub async fn admin_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, ConnectionRole::Admin))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, role: ConnectionRole) {
    let connection = ConnectionState::new(role);
    info!(
        "Socket {} connected ({:?}).",
        connection.connection_id, connection.role
    );

    let (sender, receiver) = socket.split();
    serve_connection(sender, receiver, &app_state, &connection).await;
    info!("WebSocket connection {} closed.", connection.connection_id);
}

/// Reads frames until the client leaves or the server shuts down, answering each one
/// before the next is read.
async fn serve_connection<Tx, Rx>(
    mut sender: Tx,
    mut receiver: Rx,
    app_state: &AppState,
    connection: &ConnectionState,
) where
    Tx: Sink<Message, Error = axum::Error> + Unpin,
    Rx: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let next = tokio::select! {
            _ = app_state.shutdown.cancelled() => {
                info!("Server shutting down; closing socket {}.", connection.connection_id);
                break;
            }
            next = receiver.next() => next,
        };

        match next {
            Some(Ok(Message::Text(text))) => {
                let Some(reply) = handle_text_message(text.as_str(), app_state, connection).await
                else {
                    continue;
                };
                if let Err(e) = send_message(&mut sender, &reply).await {
                    error!(
                        "Failed to send reply on socket {}: {}",
                        connection.connection_id, e
                    );
                    break;
                }
            }
            Some(Ok(Message::Close(_))) => {
                info!("Socket {} sent close message.", connection.connection_id);
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("Socket {} errored: {}", connection.connection_id, e);
                break;
            }
            None => {
                info!("Socket {} disconnected.", connection.connection_id);
                break;
            }
        }
    }

    let _ = sender.close().await;
}

/// Decodes and dispatches one text frame. Errors end here: they are logged and the
/// client gets no reply.
async fn handle_text_message(
    text: &str,
    app_state: &AppState,
    connection: &ConnectionState,
) -> Option<ServerMessage> {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(
                "Failed to deserialize message on socket {}: {}",
                connection.connection_id, e
            );
            return None;
        }
    };
    debug!("Socket {} -> {:?}", connection.connection_id, message);

    match handle_client_message(app_state, connection, message).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(
                "Failed to handle event on socket {}: {:?}",
                connection.connection_id, e
            );
            None
        }
    }
}

async fn send_message<Tx>(sender: &mut Tx, message: &ServerMessage) -> Result<(), ApiError>
where
    Tx: Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(message).map_err(|e| ApiError::Internal(e.to_string()))?;
    sender.send(Message::Text(json.into())).await?;
    Ok(())
}
