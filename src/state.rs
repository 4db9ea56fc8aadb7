//! Shared application state handed to the router.

use std::sync::Arc;

use crate::directory::RoomDirectory;
use crate::questions::QuestionBank;
use crate::room::RoomRegistry;

pub struct AppState {
    pub bank: Arc<QuestionBank>,
    pub rooms: RoomRegistry,
    pub directory: RoomDirectory,
}

impl AppState {
    pub fn new(bank: QuestionBank) -> Self {
        let bank = Arc::new(bank);
        Self {
            bank: bank.clone(),
            rooms: RoomRegistry::new(bank),
            directory: RoomDirectory::new(),
        }
    }
}
