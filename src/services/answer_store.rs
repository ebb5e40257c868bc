use std::collections::{BTreeMap, HashMap, HashSet};

use crate::errors::{SessionError, SessionResult};
use crate::models::domain::question::{Question, QuestionId};

/// Current answers for one session, keyed by question id.
///
/// Only ids of the loaded question list are accepted. Absence of an entry
/// means the question is unanswered.
#[derive(Debug, Default, Clone)]
pub struct AnswerStore {
    known: HashSet<QuestionId>,
    answers: HashMap<QuestionId, String>,
    frozen: bool,
}

impl AnswerStore {
    /// Starts over for a new question list, dropping every previous entry.
    pub fn reset(&mut self, questions: &[Question]) {
        self.known = questions.iter().map(|q| q.id.clone()).collect();
        self.answers.clear();
        self.frozen = false;
    }

    /// Inserts or overwrites. A blank value clears the entry.
    pub fn set(&mut self, id: &QuestionId, value: impl Into<String>) -> SessionResult<()> {
        if self.frozen {
            return Err(SessionError::AnswersFrozen);
        }
        if !self.known.contains(id) {
            return Err(SessionError::UnknownQuestion(id.to_string()));
        }

        let value = value.into();
        if value.trim().is_empty() {
            self.answers.remove(id);
        } else {
            self.answers.insert(id.clone(), value);
        }
        Ok(())
    }

    pub fn clear(&mut self, id: &QuestionId) -> SessionResult<()> {
        if self.frozen {
            return Err(SessionError::AnswersFrozen);
        }
        self.answers.remove(id);
        Ok(())
    }

    pub fn get(&self, id: &QuestionId) -> Option<&str> {
        self.answers.get(id).map(String::as_str)
    }

    pub fn completion_count(&self) -> usize {
        self.answers.len()
    }

    pub fn total(&self) -> usize {
        self.known.len()
    }

    pub fn is_complete(&self) -> bool {
        self.completion_count() == self.total()
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Answered entries only; unanswered ids are omitted rather than sent as null.
    pub fn to_payload(&self) -> BTreeMap<QuestionId, String> {
        self.answers
            .iter()
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect()
    }
}
