//! Command execution

pub mod audit;
pub mod executor;
pub mod target;
pub mod transport;
