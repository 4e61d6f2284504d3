//! Process-level plumbing for the daemon binary: CLI flags and logging.

pub mod cli;
pub mod logging;
