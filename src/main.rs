use anyhow::{Context, Result};
use chaincode::api::{create_invoke_router, InvokeAppState};
use chaincode::chaincode::ChaincodeRegistry;
use chaincode::config::{load_config, ChaincodeConfig};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chaincode=info".into()),
        )
        .init();

    info!("Chaincode host starting...");

    // Config file is optional; environment overrides apply either way
    let mut config = match std::env::var("CHAINCODE_CONFIG") {
        Ok(path) => load_config(&path)?,
        Err(_) => ChaincodeConfig::default(),
    };
    config.apply_env();

    info!(
        state_database = %config.ledger.state_database,
        bind_addr = %config.api.bind_addr,
        deployed = ?config.chaincodes.deployed,
        "Configuration loaded"
    );

    let registry = Arc::new(
        ChaincodeRegistry::with_record_contracts(
            &config.chaincodes.deployed,
            config.ledger.state_database,
        )
        .context("Failed to deploy chaincodes")?,
    );

    if config.ledger.seed_on_start {
        for name in registry.names() {
            let receipt = registry
                .submit(&name, "InitLedger", &[])
                .with_context(|| format!("Failed to seed chaincode {}", name))?;
            info!(chaincode = %name, tx_id = %receipt.tx_id, writes = receipt.writes, "Ledger seeded");
        }
    }

    let app_state = Arc::new(InvokeAppState {
        registry: Arc::clone(&registry),
        body_limit_bytes: config.api.body_limit_bytes,
    });
    let router = create_invoke_router(app_state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.api.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.api.bind_addr))?;
    info!(addr = %config.api.bind_addr, "Chaincode API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl_c signal");
            }
            info!("Shutdown signal received");
        })
        .await
        .context("Chaincode API server error")?;

    info!("Chaincode host stopped");
    Ok(())
}
