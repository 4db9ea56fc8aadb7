//! WebSocket transport.
//!
//! Sockets are dumb pipes: frames are parsed into `ClientMessage` and
//! forwarded to the room coordinator, and whatever the coordinator pushes
//! onto the connection's outbound channel is written back as JSON. All
//! game logic lives on the other side of the channel.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::protocol::ClientMessage;
use crate::room::RoomCommand;
use crate::state::AppState;

/// WebSocket upgrade handler for `/ws/{room_id}`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!(room = %room_id, "WebSocket connection request");

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, room_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let conn_id = ulid::Ulid::new().to_string();
    let room = state.rooms.attach(&room_id).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    room.send(RoomCommand::Attach {
        conn_id: conn_id.clone(),
        tx,
    });

    loop {
        tokio::select! {
            // Relay coordinator broadcasts to the socket
            outbound = rx.recv() => {
                match outbound {
                    Some(msg) => {
                        let Ok(json) = serde_json::to_string(&msg) else {
                            continue;
                        };
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    // The coordinator dropped this connection
                    None => break,
                }
            }

            // Handle client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(conn = %conn_id, "received message: {}", text);

                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => room.send(RoomCommand::Inbound {
                                conn_id: conn_id.clone(),
                                msg,
                            }),
                            Err(e) => {
                                // Dropped here; the coordinator never sees it
                                tracing::warn!(conn = %conn_id, "failed to parse client message: {}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!(conn = %conn_id, "WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(conn = %conn_id, "WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    room.send(RoomCommand::Detach { conn_id });
}
