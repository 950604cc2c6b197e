//! Hoist Library
//!
//! Deploys a git repository to a host by resetting a remote working copy,
//! recording every deploy so it can be reverted.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod exec;
pub mod filesys;
pub mod logs;
pub mod storage;
