use std::collections::BTreeMap;

use crate::schemas::answer::{AnswerRecord, Correctness};
use crate::services::question_store::QuestionStore;
use crate::session::error::SessionError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct AnswerEntry {
    question_id: String,
    selected_option: String,
    correctness: Correctness,
}

/// Sparse learner selections keyed by question index; last write wins.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnswerMap {
    len: usize,
    entries: BTreeMap<usize, AnswerEntry>,
}

impl AnswerMap {
    pub(crate) fn new(len: usize) -> Self {
        Self { len, entries: BTreeMap::new() }
    }

    pub(crate) fn record(
        &mut self,
        index: usize,
        question_id: &str,
        option: &str,
    ) -> Result<(), SessionError> {
        if index >= self.len {
            return Err(SessionError::IndexOutOfRange { index, len: self.len });
        }

        self.entries.insert(
            index,
            AnswerEntry {
                question_id: question_id.to_string(),
                selected_option: option.to_string(),
                correctness: Correctness::Pending,
            },
        );
        Ok(())
    }

    pub(crate) fn selected(&self, index: usize) -> Option<&str> {
        self.entries.get(&index).map(|entry| entry.selected_option.as_str())
    }

    pub(crate) fn answered(&self) -> usize {
        self.entries.values().filter(|entry| !entry.selected_option.is_empty()).count()
    }

    /// One record per question, in store order. Unvisited or empty entries
    /// become `skipped` / `not_attempted`.
    pub(crate) fn assemble(&self, store: &QuestionStore) -> Vec<AnswerRecord> {
        store
            .iter()
            .enumerate()
            .map(|(index, question)| match self.entries.get(&index) {
                Some(entry) if !entry.selected_option.is_empty() => AnswerRecord {
                    question_id: entry.question_id.clone(),
                    selected_option: entry.selected_option.clone(),
                    correctness: entry.correctness,
                },
                _ => AnswerRecord::skipped(question.id.clone()),
            })
            .collect()
    }
}
