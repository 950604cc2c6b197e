//! Deployment module

pub mod fsm;
pub mod git;
pub mod history;
pub mod hooks;
pub mod preflight;
pub mod setup;
pub mod workflow;
