//! txt2kg CLI library.
//!
//! Command-line access to a running txt2kg server: extract triples from text
//! files, load them into the configured graph database, and inspect what is
//! stored. Configuration lives in `~/.txt2kg/config.toml`.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use client::ApiClient;
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
