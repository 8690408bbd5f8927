//! WebSocket connection handlers.
//!
//! One socket binds one user to one room. Outbound events arrive on an mpsc channel
//! registered with the connection registry; inbound frames are parsed and handed to
//! the receive-message use case. Malformed frames are logged and dropped without
//! closing the connection.

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{RoomId, UserIdentity},
    infrastructure::dto::websocket::parse_client_message,
    ui::{error::ApiError, extract::identity_from, state::AppState},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub user_id: String,
    pub user_name: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> Result<Response, ApiError> {
    let room_id = RoomId::new(room_id)?;
    let display_name = query.user_name.unwrap_or_else(|| query.user_id.clone());
    let identity = identity_from(query.user_id, display_name)?;

    // Only check the room here; an abandoned handshake must not leave presence behind
    state.connect_participant_usecase.ensure_room(&room_id).await?;

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, room_id, identity))
        .into_response())
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// The channel closes when the registry drops this connection (room expired or server
/// shutting down); the socket is then closed as well.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    })
}

async fn handle_socket(
    mut socket: WebSocket,
    state: Arc<AppState>,
    room_id: RoomId,
    identity: UserIdentity,
) {
    // Create a channel for this connection to receive room events
    let (tx, rx) = mpsc::unbounded_channel();

    // Registered before the pusher starts so the join notice is the first event sent
    let participant = match state
        .connect_participant_usecase
        .execute(&room_id, identity.user_id.clone(), tx)
        .await
    {
        Ok(participant) => participant,
        Err(e) => {
            tracing::warn!(
                "Closing socket of '{}' for room '{}': {}",
                identity.user_id,
                room_id,
                e
            );
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let (sender, mut receiver) = socket.split();

    let state_clone = state.clone();
    let room_id_clone = room_id.clone();

    // Spawn a task to receive messages from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error from '{}': {}", identity.user_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let inbound = match parse_client_message(&text) {
                        Ok(inbound) => inbound,
                        Err(e) => {
                            tracing::warn!(
                                "Dropping malformed message from '{}' in room '{}': {}",
                                identity.user_id,
                                room_id_clone,
                                e
                            );
                            continue;
                        }
                    };
                    if let Err(e) = state_clone
                        .receive_message_usecase
                        .execute(&room_id_clone, &identity, inbound)
                        .await
                    {
                        tracing::warn!(
                            "Dropping message from '{}' in room '{}': {}",
                            identity.user_id,
                            room_id_clone,
                            e
                        );
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", identity.user_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push room events to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state
        .disconnect_participant_usecase
        .execute(&room_id, participant.connection_id)
        .await;
}
