use serde::Serialize;
use thiserror::Error;

use crate::models::domain::session::SessionStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Failed to fetch questions: {0}")]
    FetchFailed(String),

    #[error("Unsupported question type: {0}")]
    UnsupportedQuestionType(String),

    #[error("An API key is required before continuing")]
    MissingCredential,

    #[error("Failed to submit answers: {0}")]
    SubmitFailed(String),

    #[error("Cannot {action} while session is {from}")]
    InvalidTransition {
        from: SessionStatus,
        action: &'static str,
    },

    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("{value:?} is not an option for question {question}")]
    InvalidOption { question: String, value: String },

    #[error("Answers are frozen while the submission is in progress")]
    AnswersFrozen,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// What the host view offers the user next to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    GoBack,
    RetrySubmit,
    PromptCredential,
    None,
}

impl SessionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::FetchFailed(_) => "FETCH_FAILED",
            SessionError::UnsupportedQuestionType(_) => "UNSUPPORTED_QUESTION_TYPE",
            SessionError::MissingCredential => "MISSING_CREDENTIAL",
            SessionError::SubmitFailed(_) => "SUBMIT_FAILED",
            SessionError::InvalidTransition { .. } => "INVALID_TRANSITION",
            SessionError::UnknownQuestion(_) => "UNKNOWN_QUESTION",
            SessionError::InvalidOption { .. } => "INVALID_OPTION",
            SessionError::AnswersFrozen => "ANSWERS_FROZEN",
            SessionError::Transport(_) => "TRANSPORT_ERROR",
            SessionError::Storage(_) => "STORAGE_ERROR",
            SessionError::Config(_) => "CONFIG_ERROR",
        }
    }

    pub fn recovery(&self) -> RecoveryAction {
        match self {
            SessionError::FetchFailed(_) => RecoveryAction::GoBack,
            SessionError::SubmitFailed(_) => RecoveryAction::RetrySubmit,
            SessionError::MissingCredential => RecoveryAction::PromptCredential,
            SessionError::Transport(_) | SessionError::Storage(_) => RecoveryAction::GoBack,
            SessionError::UnsupportedQuestionType(_)
            | SessionError::InvalidTransition { .. }
            | SessionError::UnknownQuestion(_)
            | SessionError::InvalidOption { .. }
            | SessionError::AnswersFrozen
            | SessionError::Config(_) => RecoveryAction::None,
        }
    }

    /// Text safe to show to the user. Transport details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::FetchFailed(_) => {
                "We couldn't load this quiz. Please go back and try again.".to_string()
            }
            SessionError::SubmitFailed(_) => {
                "Your answers could not be submitted. They are still here, please retry."
                    .to_string()
            }
            SessionError::MissingCredential => {
                "Please add your API key to continue.".to_string()
            }
            SessionError::InvalidOption { .. } => {
                "Please choose one of the listed options.".to_string()
            }
            SessionError::Transport(_) | SessionError::Storage(_) => {
                "Something went wrong. Please go back and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Serializable error shown by the host view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub recovery: RecoveryAction,
}

impl From<&SessionError> for ErrorResponse {
    fn from(err: &SessionError) -> Self {
        ErrorResponse {
            error: err.user_message(),
            code: err.error_code(),
            recovery: err.recovery(),
        }
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        SessionError::Transport(err.to_string())
    }
}
impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Transport(format!("JSON decoding error: {}", err))
    }
}
impl From<validator::ValidationErrors> for SessionError {
    fn from(err: validator::ValidationErrors) -> Self {
        SessionError::Config(err.to_string())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
