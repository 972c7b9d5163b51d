//! CLI subcommand implementations for the chanweek binary.

pub mod doctor;
pub mod run_cmd;
pub mod summarize_cmd;
