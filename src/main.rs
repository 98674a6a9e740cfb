use botlists::api::{self, AppState};
use botlists::utils::logger;
use botlists::{CliConfig, CountStore, EnvCredentials, ServiceRegistry, SyncEngine};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = CliConfig::parse();

    logger::init_logger(config.verbose);

    tracing::info!("Starting botlists v{}", env!("CARGO_PKG_VERSION"));
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let registry = Arc::new(ServiceRegistry::from_file(&config.services_file)?);
    tracing::info!(
        "Loaded {} services from {} ({} enabled)",
        registry.len(),
        config.services_file,
        registry.all_enabled().len()
    );

    let store = CountStore::open(&config.database_path)?;
    tracing::info!("Guild count history at {}", config.database_path);

    let engine = SyncEngine::new(registry, Arc::new(EnvCredentials))?;

    let state = Arc::new(AppState { engine, store });
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Listening on {}", config.bind_address);
    axum::serve(listener, app).await?;

    Ok(())
}
