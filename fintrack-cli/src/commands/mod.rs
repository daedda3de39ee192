//! CLI command implementations

pub mod config;
pub mod run;
pub mod serve;
