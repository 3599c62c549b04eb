//! Subcommand handlers.

pub mod actions;
pub mod config_cmd;
pub mod devices;
pub mod run;
pub mod send;
