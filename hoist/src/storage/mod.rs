//! Configuration and persisted state

pub mod config;
pub mod history;
pub mod layout;
