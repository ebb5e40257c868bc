use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ErrorResponse;
use crate::models::domain::question::QuestionId;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Loading,
    Active,
    Submitting,
    Completed,
    Failed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Loading => write!(f, "loading"),
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Submitting => write!(f, "submitting"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Whether the host shows one question per screen or the whole list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    #[default]
    OnePerScreen,
    AllAtOnce,
}

/// What asked for the move out of `active`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Copy)]
#[serde(rename_all = "snake_case")]
pub enum SubmitTrigger {
    /// Submit button, before any confirmation.
    User,
    /// Submit button after the user accepted the incomplete-answers warning.
    ConfirmedByUser,
    /// Countdown reached zero.
    Expired,
}

impl SubmitTrigger {
    pub fn requires_confirmation_when_incomplete(&self) -> bool {
        matches!(self, SubmitTrigger::User)
    }
}

/// Answers frozen at the moment the session entered `submitting`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    pub attempt_id: String,
    pub answers: BTreeMap<QuestionId, String>,
    pub trigger: SubmitTrigger,
}

/// Result of asking the session to submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitGate {
    /// Incomplete answers and a user trigger: ask before going further.
    NeedsConfirmation { answered: usize, total: usize },
    /// The session is now `submitting`; send this payload exactly once.
    Proceed(SubmissionPayload),
    /// Another trigger already won the transition.
    AlreadySubmitting,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickEvent {
    /// No countdown is armed; the ticker should stop.
    Idle,
    Running { seconds_remaining: u32 },
    /// The countdown hit zero and the session moved to `submitting`.
    Expired(SubmissionPayload),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub attempt_id: String,
    pub status: SessionStatus,
    /// Question generation time is unpredictable, so loading never reports a percentage.
    pub indeterminate_progress: bool,
    pub mode: NavigationMode,
    pub current_index: usize,
    pub total_questions: usize,
    pub answered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

/// `MM:SS`, minutes are not wrapped into hours.
pub fn format_remaining(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&SessionStatus::Submitting).unwrap();
        assert_eq!(json, "\"submitting\"");
        assert_eq!(SessionStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn only_plain_user_trigger_needs_confirmation() {
        assert!(SubmitTrigger::User.requires_confirmation_when_incomplete());
        assert!(!SubmitTrigger::ConfirmedByUser.requires_confirmation_when_incomplete());
        assert!(!SubmitTrigger::Expired.requires_confirmation_when_incomplete());
    }

    #[test]
    fn format_remaining_pads_minutes_and_seconds() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(59), "00:59");
        assert_eq!(format_remaining(61), "01:01");
        assert_eq!(format_remaining(3600), "60:00");
    }
}
