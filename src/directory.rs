//! Lobby-facing room metadata store.
//!
//! Plain CRUD bookkeeping for the room browser. Coordinators never read or
//! write it; the lobby UI keeps it current through the REST surface.

use std::collections::HashMap;

use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::types::{RoomId, RoomInfo, RoomStatus};

/// Rooms idle longer than this are hidden from listings.
const STALE_AFTER_MILLIS: i64 = 5 * 60 * 1000;

/// Safe character set for room codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 6;

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
}

/// Partial update applied by `PUT /api/rooms/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomUpdate {
    pub player_count: Option<u32>,
    pub status: Option<RoomStatus>,
}

#[derive(Default)]
pub struct RoomDirectory {
    rooms: RwLock<HashMap<RoomId, RoomInfo>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, name: String) -> RoomInfo {
        let now = now_millis();
        let mut rooms = self.rooms.write().await;

        // Collision is vanishingly rare with ~31^6 codes; retry if it happens
        let id = loop {
            let code = generate_room_code();
            if !rooms.contains_key(&code) {
                break code;
            }
        };

        let info = RoomInfo {
            id: id.clone(),
            name,
            player_count: 0,
            last_activity: now,
            status: RoomStatus::Waiting,
            created_at: now,
        };
        rooms.insert(id, info.clone());
        info
    }

    pub async fn update(
        &self,
        room_id: &str,
        update: RoomUpdate,
    ) -> Result<RoomInfo, DirectoryError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| DirectoryError::RoomNotFound(room_id.to_string()))?;

        if let Some(player_count) = update.player_count {
            room.player_count = player_count;
        }
        if let Some(status) = update.status {
            room.status = status;
        }
        room.last_activity = now_millis();
        Ok(room.clone())
    }

    /// Returns whether the room existed.
    pub async fn delete(&self, room_id: &str) -> bool {
        self.rooms.write().await.remove(room_id).is_some()
    }

    pub async fn get(&self, room_id: &str) -> Option<RoomInfo> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Rooms a browser should offer: recently active, not finished,
    /// newest activity first.
    pub async fn list_active(&self) -> Vec<RoomInfo> {
        let now = now_millis();
        let rooms = self.rooms.read().await;

        let mut active: Vec<RoomInfo> = rooms
            .values()
            .filter(|room| {
                now - room.last_activity < STALE_AFTER_MILLIS
                    && room.status != RoomStatus::Finished
            })
            .cloned()
            .collect();

        active.sort_by_key(|room| std::cmp::Reverse(room.last_activity));
        active
    }
}
