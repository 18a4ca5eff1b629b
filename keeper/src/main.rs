//! # Aegis Vault Keeper
//!
//! Off-chain companion to the aegis-vault program. It watches the vault
//! and calls `rebalance` whenever the cooldown allows, so the on-chain
//! risk classifier gets to run on fresh oracle data.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 KEEPER PROCESS               │
//! │                                              │
//! │  AppConfig ──► SolanaClient ──► Solana RPC   │
//! │                     ▲                        │
//! │                     │                        │
//! │             RebalanceKeeper (interval loop)  │
//! │                     │                        │
//! │             TransactionBuilder               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! 1. Copy `.env.example` to `.env` and set `VAULT_PROGRAM_ID`
//! 2. Register the keeper key with the vault (`add_keeper`)
//! 3. `cargo run --release`

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod services;
mod solana;
mod utils;

use config::AppConfig;
use services::{load_keypair, RebalanceKeeper};
use solana::SolanaClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("🚀 Starting Aegis Vault keeper");

    let config = AppConfig::from_env()?;
    info!("📋 Configuration loaded");
    info!("   Poll interval: {}s", config.poll_interval_secs);
    info!("   Dry run: {}", config.dry_run);

    let keypair = load_keypair(&config.keypair_path)?;
    let solana = SolanaClient::new(&config);

    let keeper = RebalanceKeeper::new(solana, config, keypair);
    let handle = tokio::spawn(async move {
        keeper.start().await;
    });

    tokio::select! {
        result = handle => {
            if let Err(e) = result {
                error!("Keeper task stopped: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Shutdown signal received");
        }
    }

    Ok(())
}
