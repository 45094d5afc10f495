//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod commands;
mod logging;
mod query;
mod version;

pub use commands::{ConfigSubcommand, handle_config_command};
pub use logging::*;
pub use query::{OutputFormat, build_aggregator, render, run_service, run_services};
pub use version::display_version;
