pub mod api_client;
pub mod profile_client;
pub mod quiz_client;

pub use api_client::ApiClient;
pub use profile_client::{HttpProfileClient, ProfileClient};
pub use quiz_client::{HttpQuizClient, QuizClient};

#[cfg(test)]
pub use profile_client::MockProfileClient;
#[cfg(test)]
pub use quiz_client::MockQuizClient;
