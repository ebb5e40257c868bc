pub mod answer_store;
pub mod countdown;
pub mod credential_service;
pub mod normalizer;
pub mod pagination;
pub mod prompt;
pub mod result_renderer;
pub mod scoring;
pub mod session;
pub mod session_controller;
