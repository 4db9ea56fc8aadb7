//! Per-room game coordination.
//!
//! Every room is a single tokio task owning its state outright; the rest
//! of the process only ever talks to it through a command channel. The
//! registry maps room ids to live coordinators, spawning lazily the way
//! the lobby hands out rooms by name.

pub mod coordinator;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::protocol::{ClientMessage, ServerMessage};
use crate::questions::QuestionBank;
use crate::types::RoomId;

use coordinator::Coordinator;

/// Identifies one WebSocket connection within a room.
pub type ConnId = String;

/// Everything a room coordinator processes, in arrival order.
#[derive(Debug)]
pub enum RoomCommand {
    /// A socket opened; `tx` is its private outbound channel.
    Attach {
        conn_id: ConnId,
        tx: mpsc::UnboundedSender<ServerMessage>,
    },
    /// A parsed message arrived from this connection.
    Inbound { conn_id: ConnId, msg: ClientMessage },
    /// The socket closed or errored.
    Detach { conn_id: ConnId },
}

/// Cheap cloneable address of a room's coordinator task.
#[derive(Clone)]
pub struct RoomHandle {
    tx: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    /// Fire-and-forget; a send to a coordinator that already shut down is
    /// simply lost, matching a message to a closed room.
    pub fn send(&self, cmd: RoomCommand) {
        let _ = self.tx.send(cmd);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct RoomRegistry {
    bank: Arc<QuestionBank>,
    rooms: Mutex<HashMap<RoomId, RoomHandle>>,
}

impl RoomRegistry {
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self {
            bank,
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Get the live coordinator for `room_id`, spawning one if the room has
    /// never been seen or its previous coordinator shut down after losing
    /// all connections.
    pub async fn attach(&self, room_id: &str) -> RoomHandle {
        let mut rooms = self.rooms.lock().await;

        if let Some(handle) = rooms.get(room_id) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = RoomHandle { tx };
        let coordinator = Coordinator::new(room_id.to_string(), self.bank.clone());
        tokio::spawn(coordinator.run(rx));

        rooms.insert(room_id.to_string(), handle.clone());
        handle
    }
}
