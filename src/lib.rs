pub mod clients;
pub mod config;
pub mod context;
pub mod errors;
pub mod models;
pub mod services;
pub mod storage;

#[cfg(test)]
pub mod test_utils;
