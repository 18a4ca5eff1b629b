//! # Rebalance Keeper Service
//!
//! Polls the vault and submits `rebalance` as soon as the program would
//! accept it. All risk decisions happen on-chain; the keeper only decides
//! *whether to call*.
//!
//! ## Tick Flow
//!
//! ```text
//! every POLL_INTERVAL_SECS
//!        │
//!        ├── get_slot + get_vault_snapshot
//!        ├── log state / leverage / health factor
//!        │
//!        └── plan()
//!              ├── Unauthorized ... warn, skip
//!              ├── Cooldown ....... debug, skip
//!              └── Submit ......... send rebalance (unless DRY_RUN)
//! ```

use std::fs;
use std::time::Duration;

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use thiserror::Error;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::services::transaction_builder::{build_rebalance_instruction, find_vault_address};
use crate::solana::{RiskState, SolanaClient, SolanaClientError, VaultSnapshot};
use crate::utils::{format_ratio, format_unix, format_usdc};

#[derive(Error, Debug)]
pub enum KeeperError {
    #[error("Failed to load keypair: {0}")]
    Keypair(String),

    #[error(transparent)]
    Solana(#[from] SolanaClientError),
}

/// What a tick should do, given what the chain says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeeperAction {
    Submit,
    Cooldown { remaining_slots: u64 },
    Unauthorized,
}

pub fn plan(snapshot: &VaultSnapshot, current_slot: u64, keeper: &Pubkey) -> KeeperAction {
    if !snapshot.is_keeper(keeper) {
        return KeeperAction::Unauthorized;
    }
    match snapshot.cooldown_remaining(current_slot) {
        0 => KeeperAction::Submit,
        remaining_slots => KeeperAction::Cooldown { remaining_slots },
    }
}

/// Read a Solana CLI keypair file (JSON array of 64 bytes).
pub fn load_keypair(path: &str) -> Result<Keypair, KeeperError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| KeeperError::Keypair(format!("Failed to read {}: {}", path, e)))?;
    let bytes: Vec<u8> = serde_json::from_str(&raw)
        .map_err(|e| KeeperError::Keypair(format!("Failed to parse keypair: {}", e)))?;
    Keypair::from_bytes(&bytes).map_err(|e| KeeperError::Keypair(e.to_string()))
}

pub struct RebalanceKeeper {
    solana: SolanaClient,
    config: AppConfig,
    keypair: Keypair,
    vault: Pubkey,
}

impl RebalanceKeeper {
    pub fn new(solana: SolanaClient, config: AppConfig, keypair: Keypair) -> Self {
        let vault = find_vault_address(&config.vault_program_id);
        Self {
            solana,
            config,
            keypair,
            vault,
        }
    }

    /// Run forever. Tick failures are logged and the loop carries on.
    pub async fn start(&self) {
        info!(
            vault = %self.vault,
            keeper = %self.keypair.pubkey(),
            dry_run = self.config.dry_run,
            "Starting rebalance keeper"
        );

        let mut ticker = interval(Duration::from_secs(self.config.poll_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.tick().await {
                error!("Keeper tick failed: {}", e);
            }
        }
    }

    async fn tick(&self) -> Result<(), KeeperError> {
        let slot = self.solana.get_slot().await?;
        let snapshot = self.solana.get_vault_snapshot(&self.vault).await?;

        info!(
            slot,
            state = %snapshot.current_state,
            supplied = %format_usdc(snapshot.total_supplied),
            borrowed = %format_usdc(snapshot.total_borrowed),
            shares = snapshot.total_shares,
            share_mint = %snapshot.share_mint,
            leverage = %format_ratio(snapshot.leverage_bps()),
            max_leverage = %format_ratio(Some(snapshot.max_leverage_bps as u64)),
            health_factor = %format_ratio(snapshot.health_factor_bps()),
            hf_floor = %format_ratio(Some(snapshot.hf_floor_bps as u64)),
            "Vault status"
        );
        if snapshot.current_state > RiskState::Loop {
            warn!(
                state = %snapshot.current_state,
                reexpansion_unlocked_at = %format_unix(snapshot.reexpansion_unlocked_at),
                "Vault is de-risked"
            );
        }

        match plan(&snapshot, slot, &self.keypair.pubkey()) {
            KeeperAction::Unauthorized => {
                warn!(keeper = %self.keypair.pubkey(), "Keeper key is not authorized on this vault");
            }
            KeeperAction::Cooldown { remaining_slots } => {
                debug!(remaining_slots, "Rebalance cooldown active");
            }
            KeeperAction::Submit if self.config.dry_run => {
                info!("DRY_RUN: rebalance is due, not submitting");
            }
            KeeperAction::Submit => {
                let ix = build_rebalance_instruction(
                    &self.config.vault_program_id,
                    &self.keypair.pubkey(),
                    &self.vault,
                    &snapshot.primary_oracle,
                    &snapshot.secondary_oracle,
                );
                let signature = self.solana.send_instruction(ix, &self.keypair).await?;
                info!(%signature, "Rebalance submitted");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solana::vault_account::tests::RawVault;

    fn snapshot(raw: &RawVault) -> VaultSnapshot {
        VaultSnapshot::from_account_data(&raw.encode()).unwrap()
    }

    #[test]
    fn test_plan_submits_after_cooldown() {
        let raw = RawVault {
            last_rebalance_slot: 1_000,
            ..Default::default()
        };
        let snap = snapshot(&raw);
        assert_eq!(plan(&snap, 31_000, &raw.authority), KeeperAction::Submit);
        assert_eq!(
            plan(&snap, 30_999, &raw.authority),
            KeeperAction::Cooldown { remaining_slots: 1 }
        );
    }

    #[test]
    fn test_plan_checks_keeper_set() {
        let keeper = Pubkey::new_unique();
        let raw = RawVault {
            keepers: vec![keeper],
            ..Default::default()
        };
        let snap = snapshot(&raw);
        assert_eq!(plan(&snap, 100_000, &keeper), KeeperAction::Submit);
        assert_eq!(
            plan(&snap, 100_000, &Pubkey::new_unique()),
            KeeperAction::Unauthorized
        );
    }

    #[test]
    fn test_load_keypair_roundtrip() {
        let keypair = Keypair::new();
        let path = std::env::temp_dir().join(format!("aegis-keeper-{}.json", keypair.pubkey()));
        let json = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();
        fs::write(&path, json).unwrap();

        let loaded = load_keypair(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_keypair_missing_file() {
        let err = load_keypair("/nonexistent/aegis/keeper.json").unwrap_err();
        assert!(matches!(err, KeeperError::Keypair(_)));
    }
}
