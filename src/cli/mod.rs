//! Command handlers for the `token-ledger` binary

pub mod commands;
pub mod replay;

pub use commands::*;
pub use replay::{cmd_replay, cmd_sign, ReplayStep, ReplaySummary};
