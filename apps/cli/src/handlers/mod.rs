//! Subcommand implementations. Each writes its report to the given output.

pub mod describe;
pub mod provision;
pub mod state;
