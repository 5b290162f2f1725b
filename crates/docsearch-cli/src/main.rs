//! docsearch
//!
//! Paginated access to documents in an Elasticsearch-compatible engine.
//!
//! # Usage
//!
//! ```bash
//! docsearch create-index [--mapping PATH]
//! docsearch seed [--count N]
//! docsearch load [--from N] [--size N] [--cursor VALUE]
//! docsearch paginate offset [--size N] [--bound N]
//! docsearch paginate cursor [--size N] [--pages N] [--stop-on-empty]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/docsearch/config.toml)
//! 3. Environment variables (DOCSEARCH_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use docsearch_cli::{init_logging, load_settings, run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(&cli)?;
    init_logging(&settings.log_level)?;

    run(cli, settings).await
}
