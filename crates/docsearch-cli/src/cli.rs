//! CLI argument parsing for docsearch.
//!
//! CLI flags override every other config source.

use clap::{Parser, Subcommand};

/// docsearch
///
/// Create an index, seed it, and page through its documents.
#[derive(Parser, Debug)]
#[command(name = "docsearch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/docsearch/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Target index (default from config)
    #[arg(short, long, global = true, default_value = "")]
    pub index: String,

    /// Override the engine host
    #[arg(long, global = true)]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the index from a mapping schema file
    CreateIndex {
        /// Mapping schema path (default from config)
        #[arg(short, long)]
        mapping: Option<String>,
    },

    /// Store generated documents with ids 0..count
    Seed {
        /// Number of documents
        #[arg(short = 'n', long, default_value = "100000")]
        count: usize,
    },

    /// Fetch a single page
    Load {
        /// Offset of the first hit (ignored with --cursor)
        #[arg(long, default_value = "0")]
        from: usize,

        /// Page size
        #[arg(short, long, default_value = "10")]
        size: usize,

        /// Continue after this sort value
        #[arg(long)]
        cursor: Option<String>,
    },

    /// Fetch many pages and print the accumulated documents
    Paginate {
        #[command(subcommand)]
        strategy: PaginateCommands,
    },
}

/// Pagination strategies
#[derive(Subcommand, Debug, Clone)]
pub enum PaginateCommands {
    /// Skip-and-take pages until the record bound is covered
    Offset {
        /// Page size
        #[arg(short, long, default_value = "10")]
        size: usize,

        /// Upper bound on offsets requested
        #[arg(short, long, default_value = "100")]
        bound: usize,
    },

    /// Search-after pages, each continuing from the previous one
    Cursor {
        /// Page size
        #[arg(short, long, default_value = "10")]
        size: usize,

        /// Number of pages to request
        #[arg(short, long, default_value = "10")]
        pages: usize,

        /// Stop at the first empty page or once the total is reached
        #[arg(long)]
        stop_on_empty: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_paginate_offset_defaults() {
        let cli = Cli::parse_from(["docsearch", "paginate", "offset"]);
        match cli.command {
            Commands::Paginate {
                strategy: PaginateCommands::Offset { size, bound },
            } => {
                assert_eq!(size, 10);
                assert_eq!(bound, 100);
            }
            _ => panic!("Expected Paginate Offset command"),
        }
        assert_eq!(cli.index, "");
    }

    #[test]
    fn test_cli_paginate_cursor() {
        let cli = Cli::parse_from([
            "docsearch",
            "paginate",
            "cursor",
            "--size",
            "25",
            "--pages",
            "4",
            "--stop-on-empty",
        ]);
        match cli.command {
            Commands::Paginate {
                strategy:
                    PaginateCommands::Cursor {
                        size,
                        pages,
                        stop_on_empty,
                    },
            } => {
                assert_eq!(size, 25);
                assert_eq!(pages, 4);
                assert!(stop_on_empty);
            }
            _ => panic!("Expected Paginate Cursor command"),
        }
    }

    #[test]
    fn test_cli_load_with_cursor() {
        let cli = Cli::parse_from(["docsearch", "load", "--cursor", "41", "-s", "5"]);
        match cli.command {
            Commands::Load { from, size, cursor } => {
                assert_eq!(from, 0);
                assert_eq!(size, 5);
                assert_eq!(cursor.as_deref(), Some("41"));
            }
            _ => panic!("Expected Load command"),
        }
    }

    #[test]
    fn test_cli_seed_default_count() {
        let cli = Cli::parse_from(["docsearch", "seed"]);
        match cli.command {
            Commands::Seed { count } => assert_eq!(count, 100_000),
            _ => panic!("Expected Seed command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "docsearch",
            "create-index",
            "--index",
            "people",
            "--config",
            "/etc/docsearch.toml",
            "--log-level",
            "debug",
            "--host",
            "http://search:9200",
        ]);
        assert_eq!(cli.index, "people");
        assert_eq!(cli.config.as_deref(), Some("/etc/docsearch.toml"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.host.as_deref(), Some("http://search:9200"));
        assert!(matches!(cli.command, Commands::CreateIndex { mapping: None }));
    }
}
