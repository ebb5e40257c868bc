use async_trait::async_trait;

/// Blocking confirmation shown before a user submits with unanswered questions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmitPrompt: Send + Sync {
    /// `true` means "submit anyway".
    async fn confirm_incomplete(&self, answered: usize, total: usize) -> bool;
}

/// Answers every prompt the same way; for hosts without a dialog and for tests.
pub struct FixedAnswerPrompt(pub bool);

#[async_trait]
impl SubmitPrompt for FixedAnswerPrompt {
    async fn confirm_incomplete(&self, answered: usize, total: usize) -> bool {
        log::debug!(
            "Auto-answering incomplete submission prompt ({}/{}): {}",
            answered,
            total,
            self.0
        );
        self.0
    }
}
