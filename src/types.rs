use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type RoomId = String;
pub type PlayerId = String;
pub type QuestionId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Waiting,
    Countdown,
    Answering,
    Result,
    Finished,
}

/// One trivia item: a free-talk excerpt, its speaker, and the hint words
/// revealed one at a time. Loaded once at startup, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub speaker: String,
    pub words: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    /// When > 0, this player's answers are rejected until that many hint
    /// words are visible. Set after a wrong guess, cleared by a correct one.
    pub penalty_word_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub player_id: PlayerId,
    pub answer: String,
    /// Client-reported submission time, unix millis. Orders correct answers
    /// for rank points and picks the round's slowest submission.
    pub timestamp: i64,
}

/// The authoritative per-room snapshot. Exactly one lives per room, owned
/// by that room's coordinator task; clients only ever see whole copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub room_id: RoomId,
    pub players: Vec<Player>,
    /// In hard mode this holds the round's shuffled word order, so the
    /// snapshot stays self-describing.
    pub current_question: Option<Question>,
    pub current_word_index: usize,
    pub phase: GamePhase,
    pub answers: Vec<Answer>,
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<u32>,
    pub hard_mode: bool,
}

impl GameState {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            players: Vec::new(),
            current_question: None,
            current_word_index: 0,
            phase: GamePhase::Waiting,
            answers: Vec::new(),
            correct_answer: None,
            countdown: None,
            hard_mode: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

/// Lobby-browser metadata for a room. Lives in the room directory, not in
/// the coordinator; timestamps are unix millis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub id: RoomId,
    pub name: String,
    pub player_count: u32,
    pub last_activity: i64,
    pub status: RoomStatus,
    pub created_at: i64,
}
