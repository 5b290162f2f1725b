//! docsearch command-line library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (create-index, seed, load, paginate)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, PaginateCommands};
pub use commands::{cancel_on_shutdown_signal, execute, init_logging, load_settings, run};
