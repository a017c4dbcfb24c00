//! # ecowear-server
//!
//! REST API for the EcoWear storefront.
//!
//! This binary provides:
//! - **Product catalog**: public browsing, seller-gated listing creation
//! - **Accounts** with signed bearer tokens and buyer/seller/admin roles
//! - **Reviews** with like-toggles and seller replies
//! - **Orders** and the platform-wide sustainability impact aggregate
//! - **Per-IP rate limiting** to protect against abuse

mod api;
mod auth;
mod config;
mod error;
mod impact;
mod orders;
mod products;
mod rate_limit;
mod reviews;

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ecowear_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ecowear_server=debug")),
        )
        .init();

    info!("Starting EcoWear server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Store (creates the database file and schema if missing)
    let db = Database::open_at(&config.database_path)?;

    // Token signing key. Without a configured seed, every restart invalidates
    // all outstanding tokens.
    let signing_key = match config.signing_key_seed {
        Some(seed) => SigningKey::from_bytes(&seed),
        None => {
            warn!("ECOWEAR_SIGNING_KEY not set; using an ephemeral signing key");
            SigningKey::generate(&mut OsRng)
        }
    };

    let http_addr = config.http_addr;
    let state = AppState::new(db, config, signing_key);

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.purge_idle(std::time::Duration::from_secs(600)).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    api::serve(state, http_addr).await
}
