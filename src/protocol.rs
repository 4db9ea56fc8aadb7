//! Wire protocol: JSON messages shaped `{"type": ..., "payload": ...}`.
//!
//! Both directions are closed tagged unions. Anything that does not
//! deserialize into a known variant is dropped at the transport layer.

use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Join {
        player_name: String,
        /// Echoed by clients for convenience; the room is already fixed by
        /// the socket's URL path, so this is ignored on receipt.
        room_id: RoomId,
    },
    Start {},
    Answer { answer: String, timestamp: i64 },
    ToggleHardMode {},
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Full snapshot, sent to every connection after each state mutation.
    GameState(GameState),
    PlayerJoined(Player),
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: PlayerId },
    /// Private, once, to the joining connection: the broadcast snapshot has
    /// no notion of "which player is me".
    #[serde(rename_all = "camelCase")]
    PlayerId { player_id: PlayerId },
}
