//! The per-room game state machine.
//!
//! One coordinator task per room owns the `GameState`, the session map,
//! and the timers. Inbound messages and timer firings are processed one at
//! a time in arrival order, so nothing else can observe or mutate a room
//! mid-transition. Every mutation ends with a full-snapshot broadcast.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::questions::{self, QuestionBank};
use crate::types::*;

use super::{ConnId, RoomCommand};

pub(crate) const MIN_PLAYERS: usize = 2;
pub(crate) const WINNING_SCORE: u32 = 100;
pub(crate) const COUNTDOWN_TICKS: u32 = 5;
pub(crate) const WRONG_ANSWER_PENALTY_WORDS: u32 = 3;
pub(crate) const SLOWEST_ANSWER_DEDUCTION: u32 = 10;

pub(crate) const COUNTDOWN_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub(crate) const WORD_REVEAL_INTERVAL: Duration = Duration::from_millis(4000);
pub(crate) const LAST_WORD_GRACE: Duration = Duration::from_millis(10_000);
pub(crate) const NEXT_ROUND_DELAY: Duration = Duration::from_millis(3000);

/// Points for the nth-fastest correct answer (0-based rank).
fn rank_points(rank: usize) -> u32 {
    50u32.saturating_sub(10 * (rank as u32 + 1)).max(10)
}

/// Which timer is armed. The coordinator holds at most one pending timer;
/// arming a new one overwrites whatever the previous phase left behind, so
/// a stale callback can never fire into a later phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerKind {
    CountdownTick,
    WordReveal,
    LastWordGrace,
    NextRound,
}

struct Session {
    tx: mpsc::UnboundedSender<ServerMessage>,
    player_id: Option<PlayerId>,
}

pub struct Coordinator {
    state: GameState,
    bank: Arc<QuestionBank>,
    sessions: HashMap<ConnId, Session>,
    /// Questions already played this game; cleared when the game finishes.
    used_question_ids: HashSet<QuestionId>,
    timer: Option<(TimerKind, Instant)>,
    had_connection: bool,
}

impl Coordinator {
    pub(crate) fn new(room_id: RoomId, bank: Arc<QuestionBank>) -> Self {
        Self {
            state: GameState::new(room_id),
            bank,
            sessions: HashMap::new(),
            used_question_ids: HashSet::new(),
            timer: None,
            had_connection: false,
        }
    }

    /// Drive the room until its command channel closes or the last
    /// connection detaches. All waits are timer deadlines; the loop never
    /// sleeps in-line.
    pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<RoomCommand>) {
        let room_id = self.state.room_id.clone();
        tracing::debug!(room = %room_id, "room coordinator started");

        loop {
            match self.timer {
                Some((kind, deadline)) => {
                    tokio::select! {
                        cmd = rx.recv() => match cmd {
                            Some(cmd) => self.handle_command(cmd),
                            None => break,
                        },
                        _ = tokio::time::sleep_until(deadline) => {
                            self.timer = None;
                            self.handle_timer(kind);
                        }
                    }
                }
                None => match rx.recv().await {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
            }

            if self.had_connection && self.sessions.is_empty() {
                break;
            }
        }

        tracing::debug!(room = %room_id, "room coordinator stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Attach { conn_id, tx } => {
                self.had_connection = true;
                self.sessions.insert(
                    conn_id,
                    Session {
                        tx,
                        player_id: None,
                    },
                );
            }
            RoomCommand::Detach { conn_id } => self.handle_disconnect(&conn_id),
            RoomCommand::Inbound { conn_id, msg } => match msg {
                ClientMessage::Join { player_name, .. } => self.handle_join(&conn_id, player_name),
                ClientMessage::Start {} => self.handle_start(),
                ClientMessage::Answer { answer, timestamp } => {
                    self.handle_answer(&conn_id, answer, timestamp)
                }
                ClientMessage::ToggleHardMode {} => self.handle_toggle_hard_mode(),
            },
        }
    }

    // ---- inbound messages ----

    fn handle_join(&mut self, conn_id: &str, player_name: String) {
        let Some(session) = self.sessions.get_mut(conn_id) else {
            return;
        };
        if session.player_id.is_some() {
            tracing::debug!(room = %self.state.room_id, "ignoring second join on one connection");
            return;
        }

        let player = Player {
            id: ulid::Ulid::new().to_string(),
            name: player_name,
            score: 0,
            penalty_word_count: 0,
        };
        session.player_id = Some(player.id.clone());
        self.state.players.push(player.clone());

        tracing::info!(room = %self.state.room_id, player = %player.name, "player joined");

        // The snapshot can't tell a client which player it is.
        self.send_to(
            conn_id,
            ServerMessage::PlayerId {
                player_id: player.id.clone(),
            },
        );
        self.broadcast(ServerMessage::PlayerJoined(player));
        self.broadcast_state();
    }

    fn handle_start(&mut self) {
        match self.state.phase {
            GamePhase::Waiting => {
                if self.state.players.len() < MIN_PLAYERS {
                    tracing::debug!(
                        room = %self.state.room_id,
                        players = self.state.players.len(),
                        "start needs at least {MIN_PLAYERS} players"
                    );
                    return;
                }
                self.start_countdown();
            }
            // a second start skips the rest of the countdown
            GamePhase::Countdown => self.begin_round(),
            phase => {
                tracing::debug!(room = %self.state.room_id, ?phase, "ignoring start");
            }
        }
    }

    fn handle_answer(&mut self, conn_id: &str, answer: String, timestamp: i64) {
        if self.state.phase != GamePhase::Answering {
            return;
        }
        let Some(player_id) = self.sessions.get(conn_id).and_then(|s| s.player_id.clone()) else {
            return;
        };
        // first submission wins; later ones are dropped
        if self.state.answers.iter().any(|a| a.player_id == player_id) {
            return;
        }

        if let Some(player) = self.state.players.iter().find(|p| p.id == player_id) {
            if player.penalty_word_count > 0
                && (self.state.current_word_index as u32) + 1 < player.penalty_word_count
            {
                tracing::debug!(
                    room = %self.state.room_id,
                    player = %player.name,
                    "answer blocked until {} words are revealed",
                    player.penalty_word_count
                );
                return;
            }
        } else {
            return;
        }

        self.state.answers.push(Answer {
            player_id,
            answer,
            timestamp,
        });
        // broadcast before scoring so clients can show live submission counts
        self.broadcast_state();
        self.maybe_end_round();
    }

    fn handle_toggle_hard_mode(&mut self) {
        if self.state.phase != GamePhase::Waiting {
            return;
        }
        self.state.hard_mode = !self.state.hard_mode;
        self.broadcast_state();
    }

    fn handle_disconnect(&mut self, conn_id: &str) {
        let Some(session) = self.sessions.remove(conn_id) else {
            return;
        };
        let Some(player_id) = session.player_id else {
            return;
        };

        self.state.players.retain(|p| p.id != player_id);
        tracing::info!(room = %self.state.room_id, %player_id, "player left");

        self.broadcast(ServerMessage::PlayerLeft { player_id });
        self.broadcast_state();

        // The departed player's submitted answer stays in the round; the
        // remaining players may now all be accounted for.
        if self.state.phase == GamePhase::Answering {
            self.maybe_end_round();
        }
    }

    // ---- timers ----

    fn arm_timer(&mut self, kind: TimerKind, after: Duration) {
        self.timer = Some((kind, Instant::now() + after));
    }

    fn clear_timer(&mut self) {
        self.timer = None;
    }

    pub(crate) fn handle_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::CountdownTick => self.countdown_tick(),
            TimerKind::WordReveal => self.reveal_next_word(),
            TimerKind::LastWordGrace => {
                if self.state.phase == GamePhase::Answering {
                    self.end_round();
                }
            }
            TimerKind::NextRound => {
                if self.state.phase == GamePhase::Result {
                    self.start_countdown();
                }
            }
        }
    }

    // ---- phase transitions ----

    fn start_countdown(&mut self) {
        self.state.phase = GamePhase::Countdown;
        self.state.countdown = Some(COUNTDOWN_TICKS);
        self.broadcast_state();
        self.arm_timer(TimerKind::CountdownTick, COUNTDOWN_TICK_INTERVAL);
    }

    fn countdown_tick(&mut self) {
        if self.state.phase != GamePhase::Countdown {
            return;
        }
        let remaining = self.state.countdown.unwrap_or(0).saturating_sub(1);
        if remaining == 0 {
            self.begin_round();
        } else {
            self.state.countdown = Some(remaining);
            self.broadcast_state();
            self.arm_timer(TimerKind::CountdownTick, COUNTDOWN_TICK_INTERVAL);
        }
    }

    fn begin_round(&mut self) {
        let Some(mut question) = self.bank.pick(&self.used_question_ids) else {
            tracing::warn!(room = %self.state.room_id, "question bank is empty, round not started");
            return;
        };
        self.used_question_ids.insert(question.id.clone());

        if self.state.hard_mode {
            question = questions::shuffle_words(&question);
        }

        self.state.phase = GamePhase::Answering;
        self.state.current_question = Some(question);
        self.state.current_word_index = 0;
        self.state.answers.clear();
        self.state.correct_answer = None;
        self.state.countdown = None;

        self.broadcast_state();
        self.arm_timer(TimerKind::WordReveal, WORD_REVEAL_INTERVAL);
    }

    fn reveal_next_word(&mut self) {
        if self.state.phase != GamePhase::Answering {
            return;
        }
        let word_count = self
            .state
            .current_question
            .as_ref()
            .map(|q| q.words.len())
            .unwrap_or(0);

        if self.state.current_word_index + 1 < word_count {
            self.state.current_word_index += 1;
            self.broadcast_state();
            self.arm_timer(TimerKind::WordReveal, WORD_REVEAL_INTERVAL);
        } else {
            // every word is out; stragglers get one last window
            self.arm_timer(TimerKind::LastWordGrace, LAST_WORD_GRACE);
        }
    }

    fn maybe_end_round(&mut self) {
        if self.state.phase != GamePhase::Answering {
            return;
        }
        let everyone_answered = !self.state.players.is_empty()
            && self
                .state
                .players
                .iter()
                .all(|p| self.state.answers.iter().any(|a| a.player_id == p.id));
        if everyone_answered {
            self.end_round();
        }
    }

    /// Close the round and score it: wrong guesses earn a word penalty,
    /// the slowest submission loses points, correct guesses earn rank
    /// points in submission-time order.
    fn end_round(&mut self) {
        self.clear_timer();
        self.state.phase = GamePhase::Result;

        let correct = self
            .state
            .current_question
            .as_ref()
            .map(|q| q.speaker.clone())
            .unwrap_or_default();
        self.state.correct_answer = Some(correct.clone());

        let answers = self.state.answers.clone();

        // wrong guesses wait out the first words of their next round
        for answer in answers.iter().filter(|a| a.answer != correct) {
            if let Some(player) = self
                .state
                .players
                .iter_mut()
                .find(|p| p.id == answer.player_id)
            {
                player.penalty_word_count = WRONG_ANSWER_PENALTY_WORDS;
            }
        }

        // the slowest submission loses points, right or wrong; ties keep
        // the earlier-seen answer
        if answers.len() > 1 {
            let slowest = answers
                .iter()
                .reduce(|slowest, a| if a.timestamp > slowest.timestamp { a } else { slowest });
            if let Some(slowest) = slowest {
                if let Some(player) = self
                    .state
                    .players
                    .iter_mut()
                    .find(|p| p.id == slowest.player_id)
                {
                    player.score = player.score.saturating_sub(SLOWEST_ANSWER_DEDUCTION);
                    tracing::debug!(
                        room = %self.state.room_id,
                        player = %player.name,
                        "slowest answer, -{SLOWEST_ANSWER_DEDUCTION} points"
                    );
                }
            }
        }

        // rank points for correct guesses, fastest first; stable sort keeps
        // submission order on timestamp ties
        let mut correct_answers: Vec<&Answer> =
            answers.iter().filter(|a| a.answer == correct).collect();
        correct_answers.sort_by_key(|a| a.timestamp);

        for (rank, answer) in correct_answers.iter().enumerate() {
            if let Some(player) = self
                .state
                .players
                .iter_mut()
                .find(|p| p.id == answer.player_id)
            {
                player.score += rank_points(rank);
                player.penalty_word_count = 0;
            }
        }

        self.broadcast_state();

        if self
            .state
            .players
            .iter()
            .any(|p| p.score >= WINNING_SCORE)
        {
            self.finish_game();
        } else {
            self.arm_timer(TimerKind::NextRound, NEXT_ROUND_DELAY);
        }
    }

    fn finish_game(&mut self) {
        self.clear_timer();
        self.state.phase = GamePhase::Finished;
        self.state.players.sort_by(|a, b| b.score.cmp(&a.score));
        // a fresh game in this room may reuse any question
        self.used_question_ids.clear();

        tracing::info!(
            room = %self.state.room_id,
            winner = self.state.players.first().map(|p| p.name.as_str()).unwrap_or(""),
            "game finished"
        );
        self.broadcast_state();
    }

    // ---- delivery ----

    fn send_to(&mut self, conn_id: &str, msg: ServerMessage) {
        let dead = match self.sessions.get(conn_id) {
            Some(session) => session.tx.send(msg).is_err(),
            None => false,
        };
        if dead {
            self.handle_disconnect(conn_id);
        }
    }

    /// Fire-and-forget to every session. A failed send means the receiver
    /// is gone, which is treated as that connection disconnecting; the
    /// others are unaffected.
    fn broadcast(&mut self, msg: ServerMessage) {
        let mut dead: Vec<ConnId> = Vec::new();
        for (conn_id, session) in &self.sessions {
            if session.tx.send(msg.clone()).is_err() {
                dead.push(conn_id.clone());
            }
        }
        for conn_id in dead {
            tracing::debug!(room = %self.state.room_id, conn = %conn_id, "dropping dead connection");
            self.handle_disconnect(&conn_id);
        }
    }

    fn broadcast_state(&mut self) {
        let snapshot = self.state.clone();
        self.broadcast(ServerMessage::GameState(snapshot));
    }
}
