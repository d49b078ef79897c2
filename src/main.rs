//! # Context Readers CLI (`ctx-read`)
//!
//! Inspect and run the personal-data readers from the command line.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ctx-read sources` | List readers, their source paths and availability |
//! | `ctx-read browsers` | List detected browser profile directories |
//! | `ctx-read load <reader>` | Run one reader and print its documents as JSON |
//!
//! ## Examples
//!
//! ```bash
//! # What can be read on this machine?
//! ctx-read sources
//!
//! # Last 50 browser visits from a Brave profile
//! ctx-read load browser --limit 50 \
//!     --path "$HOME/Library/Application Support/BraveSoftware/Brave-Browser/Default"
//!
//! # One document per message from a WeChat export
//! ctx-read load wechat --path ./wechat-export --individual --output wechat.json
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use context_readers::{config, export, sources};

/// Context Readers CLI: turn local personal-data stores into indexable
/// documents.
#[derive(Parser)]
#[command(
    name = "ctx-read",
    about = "Read browser, message, mail, calendar and chat history into documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Optional: when the file does not exist every reader uses its default
    /// location and limits.
    #[arg(long, global = true, default_value = "./config/ctx-read.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List readers and whether their source exists.
    Sources,

    /// List browser profile base directories found on this machine.
    Browsers,

    /// Run one reader and print its documents as JSON.
    Load {
        /// Reader name: `browser`, `imessage`, `mail`, `calendar`, `wechat`,
        /// or a configured remote reader.
        reader: String,

        /// Source location overriding the configured/default one.
        #[arg(long)]
        path: Option<PathBuf>,

        /// Maximum number of documents (0 = unlimited). Defaults to
        /// `load.max_count`.
        #[arg(long)]
        limit: Option<i64>,

        /// Emit one document per message instead of per conversation.
        #[arg(long)]
        individual: bool,

        /// Write JSON to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::debug!(config = %cli.config.display(), "config file not found, using defaults");
        config::Config::minimal()
    };

    match cli.command {
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Browsers => {
            sources::list_browsers(&cfg)?;
        }
        Commands::Load {
            reader,
            path,
            limit,
            individual,
            output,
        } => {
            export::run_load(
                &cfg,
                &reader,
                path.as_deref(),
                limit,
                individual,
                output.as_deref(),
            )
            .await?;
        }
    }

    Ok(())
}
