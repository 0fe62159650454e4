use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schemas::identity::SessionIdentity;
use crate::services::delivery::DeliveryReceipt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SessionPhase {
    AwaitingRegistration,
    InProgress,
    Submitting,
    Completed,
    DeliveryFailed,
}

/// Everything a renderer needs to draw the current screen.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SessionView {
    pub(crate) phase: SessionPhase,
    pub(crate) session_id: Option<Uuid>,
    pub(crate) identity: Option<SessionIdentity>,
    pub(crate) total_questions: usize,
    pub(crate) answered: usize,
    pub(crate) timer: Option<TimerView>,
    pub(crate) question: Option<QuestionView>,
    pub(crate) navigation: Option<NavigationView>,
    pub(crate) notice: Option<String>,
    pub(crate) result: Option<ResultView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct TimerView {
    pub(crate) remaining_seconds: u64,
    pub(crate) display: String,
    pub(crate) running: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct QuestionView {
    pub(crate) index: usize,
    pub(crate) id: String,
    pub(crate) prompt: String,
    pub(crate) counter: String,
    pub(crate) options: Vec<OptionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct OptionView {
    pub(crate) key: String,
    pub(crate) text: String,
    pub(crate) selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct NavigationView {
    pub(crate) can_previous: bool,
    pub(crate) can_next: bool,
    pub(crate) submit_visible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ResultView {
    pub(crate) message: String,
    pub(crate) filename: String,
    pub(crate) delivery: Option<DeliveryReceipt>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SelectOptionRequest {
    pub(crate) option: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExportResponse {
    pub(crate) filename: String,
    pub(crate) path: String,
}
