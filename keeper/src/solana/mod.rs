//! # Solana Client Module
//!
//! Thin wrapper around the nonblocking `RpcClient`. Every read goes
//! through `retry_rpc_operation`: a per-attempt timeout plus exponential
//! backoff, so a flaky public RPC costs a tick, not the process.
//!
//! ## Account Data Flow
//!
//! ```text
//! 1. Keeper asks for the vault
//!              ↓
//! 2. SolanaClient.get_vault_snapshot()
//!              ↓
//! 3. RPC returns raw account bytes
//!              ↓
//! 4. VaultSnapshot::from_account_data()
//! ```

use std::sync::Arc;
use std::time::Duration;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

pub mod vault_account;

pub use vault_account::{RiskState, VaultSnapshot};

#[derive(Error, Debug)]
pub enum SolanaClientError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("RPC operation timed out after {0} attempts")]
    Timeout(u32),

    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    #[error("Failed to decode account: {0}")]
    Decode(String),
}

impl SolanaClientError {
    /// Errors that another attempt cannot fix.
    fn is_permanent(&self) -> bool {
        matches!(
            self,
            SolanaClientError::AccountNotFound(_) | SolanaClientError::Decode(_)
        )
    }
}

#[derive(Clone)]
pub struct SolanaClient {
    rpc: Arc<RpcClient>,
    rpc_timeout: Duration,
}

impl SolanaClient {
    pub fn new(config: &AppConfig) -> Self {
        info!("Solana client initialized:");
        info!("  RPC: {}", config.solana_rpc_url);
        info!("  Program: {}", config.vault_program_id);

        Self {
            rpc: Arc::new(RpcClient::new_with_commitment(
                config.solana_rpc_url.clone(),
                CommitmentConfig::confirmed(),
            )),
            rpc_timeout: Duration::from_secs(config.rpc_timeout_secs),
        }
    }

    /// Execute an RPC operation with retry logic.
    ///
    /// Up to 4 attempts (initial + 3 retries), backing off 200ms, 400ms,
    /// 800ms. Permanent errors return immediately.
    async fn retry_rpc_operation<F, Fut, T>(&self, mut operation: F) -> Result<T, SolanaClientError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, SolanaClientError>>,
    {
        const MAX_RETRIES: u32 = 3;
        const INITIAL_DELAY_MS: u64 = 200;

        let mut attempt = 0;
        loop {
            let failure = match timeout(self.rpc_timeout, operation()).await {
                Ok(Ok(result)) => {
                    if attempt > 0 {
                        info!("RPC operation succeeded after {} retries", attempt);
                    }
                    return Ok(result);
                }
                Ok(Err(e)) if e.is_permanent() => return Err(e),
                Ok(Err(e)) => e,
                Err(_) => SolanaClientError::Timeout(attempt + 1),
            };

            if attempt >= MAX_RETRIES {
                warn!("RPC operation failed after {} attempts: {}", attempt + 1, failure);
                return Err(failure);
            }

            let delay_ms = INITIAL_DELAY_MS * (1 << attempt);
            debug!(
                "RPC operation failed (attempt {}): {}. Retrying in {}ms...",
                attempt + 1,
                failure,
                delay_ms
            );
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            attempt += 1;
        }
    }

    pub async fn get_slot(&self) -> Result<u64, SolanaClientError> {
        self.retry_rpc_operation(|| async move {
            self.rpc
                .get_slot()
                .await
                .map_err(|e| SolanaClientError::Rpc(e.to_string()))
        })
        .await
    }

    pub async fn get_vault_snapshot(&self, vault: &Pubkey) -> Result<VaultSnapshot, SolanaClientError> {
        let data = self
            .retry_rpc_operation(|| async move {
                self.rpc
                    .get_account_with_commitment(vault, self.rpc.commitment())
                    .await
                    .map_err(|e| SolanaClientError::Rpc(e.to_string()))?
                    .value
                    .map(|account| account.data)
                    .ok_or(SolanaClientError::AccountNotFound(*vault))
            })
            .await?;

        VaultSnapshot::from_account_data(&data)
    }

    /// Sign with `payer` and submit. Not retried: if it fails, the next tick
    /// re-reads the vault and decides again.
    pub async fn send_instruction(
        &self,
        instruction: Instruction,
        payer: &Keypair,
    ) -> Result<Signature, SolanaClientError> {
        let blockhash = timeout(self.rpc_timeout, self.rpc.get_latest_blockhash())
            .await
            .map_err(|_| SolanaClientError::Timeout(1))?
            .map_err(|e| SolanaClientError::Rpc(format!("Failed to get blockhash: {}", e)))?;

        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&payer.pubkey()),
            &[payer],
            blockhash,
        );

        // confirmation can take several slots
        timeout(self.rpc_timeout * 6, self.rpc.send_and_confirm_transaction(&transaction))
            .await
            .map_err(|_| SolanaClientError::Timeout(1))?
            .map_err(|e| SolanaClientError::Rpc(format!("Failed to submit: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn client() -> SolanaClient {
        SolanaClient {
            rpc: Arc::new(RpcClient::new("http://127.0.0.1:1".to_string())),
            rpc_timeout: Duration::from_millis(50),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_from_transient_errors() {
        let calls = AtomicU32::new(0);
        let result = client()
            .retry_rpc_operation(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(SolanaClientError::Rpc("connection reset".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_four_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = client()
            .retry_rpc_operation(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(SolanaClientError::Rpc("503".to_string())) }
            })
            .await;
        assert!(matches!(result, Err(SolanaClientError::Rpc(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let missing = Pubkey::new_unique();
        let result: Result<(), _> = client()
            .retry_rpc_operation(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(SolanaClientError::AccountNotFound(missing)) }
            })
            .await;
        assert!(matches!(result, Err(SolanaClientError::AccountNotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_are_reported() {
        let result: Result<(), _> = client()
            .retry_rpc_operation(|| async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(SolanaClientError::Timeout(4))));
    }
}
