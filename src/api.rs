//! HTTP API endpoints for the lobby browser.
//!
//! Room metadata CRUD plus the speaker list that populates the answer
//! buttons. Game traffic never goes through here; rooms are driven over
//! the WebSocket in `ws`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::directory::{DirectoryError, RoomUpdate};
use crate::state::AppState;
use crate::types::RoomInfo;

impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        match self {
            DirectoryError::RoomNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string()).into_response()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateRoomRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteRoomResponse {
    pub success: bool,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/rooms", get(list_rooms).post(create_room))
        .route("/api/rooms/{room_id}", put(update_room).delete(delete_room))
        .route("/api/speakers", get(list_speakers))
}

/// List rooms a browser should offer.
///
/// GET /api/rooms
async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomInfo>> {
    Json(state.directory.list_active().await)
}

/// Register a new room and hand back its generated code.
///
/// POST /api/rooms
async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoomRequest>,
) -> (StatusCode, Json<RoomInfo>) {
    let name = req.name.unwrap_or_else(|| "New Room".to_string());
    let info = state.directory.create(name).await;
    tracing::info!(room = %info.id, name = %info.name, "room created");
    (StatusCode::CREATED, Json(info))
}

/// Update a room's lobby metadata and bump its activity timestamp.
///
/// PUT /api/rooms/{room_id}
async fn update_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(update): Json<RoomUpdate>,
) -> Result<Json<RoomInfo>, DirectoryError> {
    let info = state.directory.update(&room_id, update).await?;
    Ok(Json(info))
}

/// DELETE /api/rooms/{room_id}
async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Json<DeleteRoomResponse> {
    let success = state.directory.delete(&room_id).await;
    Json(DeleteRoomResponse { success })
}

/// Distinct speaker labels across the question bank, for answer buttons.
///
/// GET /api/speakers
async fn list_speakers(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.bank.speakers())
}
