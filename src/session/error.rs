use thiserror::Error;

use crate::schemas::session::SessionPhase;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum SessionError {
    #[error("action not allowed while the session is {0:?}")]
    WrongPhase(SessionPhase),
    #[error("the test has already been submitted")]
    AlreadySubmitted,
    #[error("there is no question to answer")]
    NoQuestions,
    #[error("option '{0}' does not belong to the current question")]
    UnknownOption(String),
    #[error("answers can only be submitted from the last question")]
    SubmitUnavailable,
    #[error("question index {index} is outside 0..{len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("failed to encode answers: {0}")]
    Encode(String),
}
