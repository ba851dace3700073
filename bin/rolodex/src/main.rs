//! `rolodex` — the Rolodex CLI client.
//!
//! Lists collections, adds companies, submits bulk transfers, and
//! watches in-flight transfers until they settle. In-flight task ids
//! are persisted to `~/.rolodex/state.json` so a restarted CLI can
//! pick them back up with `rolodex watch`.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rolodex_client::HttpTransport;

/// Rolodex CLI tool.
#[derive(Parser, Debug)]
#[command(name = "rolodex", about = "Rolodex CLI client")]
struct Cli {
    /// Server URL.
    #[arg(long = "server", global = true, default_value = "http://localhost:8080")]
    server: String,

    /// Path to the client state file (default: ~/.rolodex/state.json).
    #[arg(long = "state", global = true)]
    state: Option<String>,

    /// Output format: table or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List collections.
    Collections,

    /// Show one page of a collection.
    Show {
        /// Collection ID.
        id: String,
        /// Offset for pagination.
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Page size.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Add specific companies to a collection.
    Add {
        /// Target collection ID.
        id: String,
        /// Company IDs to add.
        #[arg(required = true)]
        company_ids: Vec<i64>,
    },

    /// Copy every company from one collection into another as a
    /// background task.
    Bulk {
        /// Target collection ID.
        id: String,
        /// Source collection ID.
        #[arg(long = "from")]
        source: String,
        /// Keep polling until the transfer settles.
        #[arg(long)]
        watch: bool,
    },

    /// Poll every remembered in-flight transfer until all settle.
    Watch {
        /// Collection currently being viewed; finished transfers that
        /// touch it produce a refresh notice.
        #[arg(long)]
        collection: Option<String>,
    },

    /// Check server status.
    Status,
}

fn state_path(cli: &Cli) -> PathBuf {
    if let Some(path) = &cli.state {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".rolodex").join("state.json")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let transport = Arc::new(HttpTransport::new(cli.server.clone()));
    let state_path = state_path(&cli);
    let json = cli.output == "json";

    match cli.command {
        Commands::Collections => {
            commands::collections::list(&transport, json).await?;
        }
        Commands::Show { id, offset, limit } => {
            commands::collections::show(&transport, &id, offset, limit, json).await?;
        }
        Commands::Add { id, company_ids } => {
            commands::collections::add(&transport, &id, &company_ids, json).await?;
        }
        Commands::Bulk { id, source, watch } => {
            commands::bulk::submit(&transport, &id, &source, watch, &state_path).await?;
        }
        Commands::Watch { collection } => {
            commands::watch::run(&transport, collection.as_deref(), &state_path).await?;
        }
        Commands::Status => {
            commands::status::check(&cli.server).await?;
        }
    }

    Ok(())
}
