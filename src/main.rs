use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use company_registry_api::{
    app,
    config::AppConfig,
    database::{MemoryStore, PgStore, Store},
    services::ensure_default_admin,
    AppState,
};

#[derive(Parser)]
#[command(name = "company-registry-api")]
#[command(about = "REST API for user accounts and company records")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Keep all data in process memory instead of PostgreSQL")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate(!args.in_memory).context("invalid configuration")?;
    if args.in_memory && config.is_production() {
        anyhow::bail!("--in-memory cannot be used when APP_ENV=production");
    }
    tracing::info!("Starting company registry API in {:?} mode", config.environment);

    let store: Arc<dyn Store> = if args.in_memory {
        tracing::warn!("Using in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        tracing::info!(
            "Connecting to {}",
            config.redacted_database_url().unwrap_or_default()
        );
        Arc::new(
            PgStore::connect(&config.database)
                .await
                .context("failed to connect to PostgreSQL")?,
        )
    };

    ensure_default_admin(store.as_ref(), &config.bootstrap)
        .await
        .context("failed to seed administrator")?;

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::new(store, config);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
