//! # Configuration Module
//!
//! Loads keeper settings from environment variables. Call
//! `dotenvy::dotenv()` first to pick up a local `.env` file.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SOLANA_RPC_URL` | Solana RPC endpoint | `https://api.devnet.solana.com` |
//! | `VAULT_PROGRAM_ID` | Deployed aegis-vault program | required |
//! | `KEEPER_KEYPAIR_PATH` | Keypair that signs `rebalance` | `~/.config/solana/id.json` |
//! | `POLL_INTERVAL_SECS` | Seconds between vault polls | `30` |
//! | `RPC_TIMEOUT_SECS` | Per-attempt RPC timeout | `10` |
//! | `DRY_RUN` | Log decisions without submitting | `false` |

use std::env;
use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is missing
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    /// Failed to parse a value
    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Solana RPC endpoint URL.
    ///
    /// Common values:
    /// - Devnet: `https://api.devnet.solana.com`
    /// - Mainnet: `https://api.mainnet-beta.solana.com`
    /// - Local: `http://localhost:8899`
    pub solana_rpc_url: String,

    pub vault_program_id: Pubkey,

    /// Tilde-expanded path to the keeper keypair (JSON byte array).
    pub keypair_path: String,

    pub poll_interval_secs: u64,

    pub rpc_timeout_secs: u64,

    /// When set, the keeper evaluates every tick but never submits.
    pub dry_run: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let program_id = get_env("VAULT_PROGRAM_ID")?;
        let vault_program_id = Pubkey::from_str(&program_id).map_err(|e| {
            ConfigError::InvalidValue("VAULT_PROGRAM_ID".to_string(), e.to_string())
        })?;

        let raw_keypair_path = get_env_or_default("KEEPER_KEYPAIR_PATH", "~/.config/solana/id.json");
        let keypair_path = shellexpand::full(&raw_keypair_path)
            .map_err(|e| ConfigError::InvalidValue("KEEPER_KEYPAIR_PATH".to_string(), e.to_string()))?
            .into_owned();

        let poll_interval_secs = parse_env("POLL_INTERVAL_SECS", "30")?;
        if poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "POLL_INTERVAL_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            solana_rpc_url: get_env_or_default("SOLANA_RPC_URL", "https://api.devnet.solana.com"),
            vault_program_id,
            keypair_path,
            poll_interval_secs,
            rpc_timeout_secs: parse_env("RPC_TIMEOUT_SECS", "10")?,
            dry_run: parse_bool(&get_env_or_default("DRY_RUN", "false"))
                .ok_or_else(|| ConfigError::ParseError("DRY_RUN".to_string(), "expected true/false".to_string()))?,
        })
    }
}

/// Get a required environment variable.
fn get_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env(key: &str, default: &str) -> Result<u64, ConfigError> {
    get_env_or_default(key, default)
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::ParseError(key.to_string(), e.to_string()))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_or_default() {
        let value = get_env_or_default("AEGIS_NONEXISTENT_VAR_12345", "default_value");
        assert_eq!(value, "default_value");
    }

    #[test]
    fn test_parse_env_default() {
        assert_eq!(parse_env("AEGIS_NONEXISTENT_INTERVAL", "30").unwrap(), 30);
        assert!(parse_env("AEGIS_NONEXISTENT_INTERVAL", "soon").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" 1 "), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool(""), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_missing_required_var() {
        let err = get_env("AEGIS_NONEXISTENT_PROGRAM_ID").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }
}
