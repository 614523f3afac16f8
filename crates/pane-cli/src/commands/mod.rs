//! CLI subcommand implementations.

pub mod add;
pub mod apps;
pub mod run;
pub mod storage;
