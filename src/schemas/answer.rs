use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Selection recorded for a question the learner never answered.
pub(crate) const SKIPPED_OPTION: &str = "skipped";

/// Annotation slot for downstream grading; this crate only ever writes
/// `Pending` and `NotAttempted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Correctness {
    Pending,
    #[allow(dead_code)]
    Correct,
    #[allow(dead_code)]
    Incorrect,
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct AnswerRecord {
    #[serde(rename = "id")]
    pub(crate) question_id: String,
    pub(crate) selected_option: String,
    pub(crate) correctness: Correctness,
}

impl AnswerRecord {
    pub(crate) fn skipped(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            selected_option: SKIPPED_OPTION.to_string(),
            correctness: Correctness::NotAttempted,
        }
    }

    pub(crate) fn is_skipped(&self) -> bool {
        self.selected_option == SKIPPED_OPTION
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SubmitTrigger {
    Manual,
    Timeout,
}

impl SubmitTrigger {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Timeout => "timeout",
        }
    }
}

/// Body of the `student_answers_<millis>.json` file.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AnswerPayload {
    pub(crate) student_id: String,
    pub(crate) session_id: Uuid,
    pub(crate) submitted_at: String,
    pub(crate) trigger: SubmitTrigger,
    pub(crate) total_questions: usize,
    pub(crate) answers: Vec<AnswerRecord>,
}
