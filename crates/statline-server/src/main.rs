// statline server entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr)
// 2. Load config
// 3. Open database, seed it from the stats CSV when empty
// 4. Build the stats service
// 5. Serve WebSocket clients until Ctrl+C

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use statline_core::db::Database;
use statline_core::loader;
use statline_engine::StatsService;
use statline_server::config;
use statline_server::ws_server;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("statline server starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: bind={}, allowed origin={}",
        config.bind_addr(),
        config.server.allowed_origin
    );

    // 3. Open database and seed it
    if let Some(parent) = Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
    }
    let db = Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    let imported = loader::bootstrap_if_empty(&db, &config.stats_csv)
        .context("failed to seed database from stats CSV")?;
    if imported > 0 {
        info!("Seeded database with {imported} records");
    }

    // 4. Build the stats service
    let service = Arc::new(StatsService::new(db));

    // 5. Serve until Ctrl+C
    let listener = ws_server::bind(&config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    let allowed_origin = config.server.allowed_origin.clone();

    tokio::select! {
        result = ws_server::run(listener, service, allowed_origin) => {
            if let Err(e) = &result {
                error!("WebSocket server error: {e:#}");
            }
            result?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            info!("Ctrl+C received");
        }
    }

    info!("statline server shut down cleanly");
    Ok(())
}

/// Initialize tracing to stderr. `RUST_LOG` overrides the default filter.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("statline_server=info,statline_core=info,statline_engine=info,warn")
        }))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
