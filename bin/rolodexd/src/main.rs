//! `rolodexd` — the Rolodex server binary.
//!
//! Usage:
//!   rolodexd [--listen <addr>] [--seed <count>] [--insert-latency-us <us>]
//!
//! Serves the collections API plus the background task API. The data
//! store is in-memory and seeded at startup, so every run starts from
//! the same state.

mod routes;
mod seed;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rolodex_collections::store::{CompanyStore, MemStore};
use rolodex_collections::CollectionsModule;
use rolodex_core::Module;
use rolodex_tasks::TasksModule;
use tracing::info;

/// Rolodex server.
#[derive(Parser, Debug)]
#[command(name = "rolodexd", about = "Rolodex server")]
struct Cli {
    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Number of companies to seed into the source collection.
    #[arg(long = "seed", default_value_t = 10_000)]
    seed: usize,

    /// Artificial per-row insert latency in microseconds, to make bulk
    /// transfers observable while polling.
    #[arg(long = "insert-latency-us", default_value_t = 500)]
    insert_latency_us: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Initialize storage and seed it.
    let store = Arc::new(MemStore::new(Duration::from_micros(
        cli.insert_latency_us,
    )));
    seed::populate(&store, cli.seed).await;
    info!("Store seeded with {} companies", cli.seed);

    // Initialize modules. Collections shares the registry owned by the
    // tasks module so its bulk transfers show up under /tasks.
    let tasks_module = TasksModule::new();
    info!("Tasks module initialized");

    let collections_module = CollectionsModule::new(
        Arc::clone(&store) as Arc<dyn CompanyStore>,
        Arc::clone(tasks_module.registry()),
    );
    info!("Collections module initialized");

    let module_routes = vec![
        (tasks_module.name().to_string(), tasks_module.routes()),
        (
            collections_module.name().to_string(),
            collections_module.routes(),
        ),
    ];

    // Build router.
    let app = routes::build_router(module_routes);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("Rolodex server listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
