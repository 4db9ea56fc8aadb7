//! The immutable question bank.
//!
//! Loaded once at process start from the dataset embedded in the binary.
//! Selection state (which questions a room has already used) belongs to
//! the room coordinator, not the bank.

use std::collections::{BTreeSet, HashSet};

use rand::seq::{IndexedRandom, SliceRandom};

use crate::types::{Question, QuestionId};

static QUESTION_DATA: &str = include_str!("../data/questions.json");

pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Parse the embedded dataset.
    pub fn builtin() -> Result<Self, serde_json::Error> {
        let questions = serde_json::from_str(QUESTION_DATA)?;
        Ok(Self { questions })
    }

    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Pick uniformly at random among questions not in `exclude`. Once the
    /// exclusion set covers the whole bank, selection resets and the full
    /// bank is eligible again. `None` only for an empty bank.
    pub fn pick(&self, exclude: &HashSet<QuestionId>) -> Option<Question> {
        let mut rng = rand::rng();
        let fresh: Vec<&Question> = self
            .questions
            .iter()
            .filter(|q| !exclude.contains(&q.id))
            .collect();

        let pool = if fresh.is_empty() {
            self.questions.iter().collect()
        } else {
            fresh
        };

        pool.choose(&mut rng).map(|q| (*q).clone())
    }

    /// Distinct speaker labels, lexicographically sorted so clients get a
    /// stable answer-button layout across reconnects.
    pub fn speakers(&self) -> Vec<String> {
        let labels: BTreeSet<&str> = self.questions.iter().map(|q| q.speaker.as_str()).collect();
        labels.into_iter().map(String::from).collect()
    }
}

/// Hard mode: permute the hint words with an unbiased shuffle. Called once
/// per round; the returned permutation is stored on the round's question
/// and stays fixed until scoring.
pub fn shuffle_words(question: &Question) -> Question {
    let mut words = question.words.clone();
    words.shuffle(&mut rand::rng());
    Question {
        words,
        ..question.clone()
    }
}
