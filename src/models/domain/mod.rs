pub mod question;
pub mod result;
pub mod session;
pub use question::{Question, QuestionId, QuestionKind, QuestionOption};
pub use result::{AssessmentResult, Correctness, ResultRow};
pub use session::{NavigationMode, SessionSnapshot, SessionStatus};
