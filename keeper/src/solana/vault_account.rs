//! Raw decoding of the on-chain `Vault` account.
//!
//! The keeper does not link the program crate; it reads the Anchor account
//! bytes directly, the same way any external indexer would.
//!
//! ## Account Structure (Anchor, borsh)
//!
//! ```text
//! Offset | Size | Field
//! -------|------|------
//! 0      | 8    | Anchor discriminator
//! 8      | 32   | authority
//! 40     | 32   | usdc_mint
//! 72     | 32   | vault_usdc
//! 104    | 32   | share_mint
//! 136    | 32   | primary_oracle
//! 168    | 32   | secondary_oracle
//! 200    | 8    | total_supplied
//! 208    | 8    | total_borrowed
//! 216    | 8    | total_shares
//! 224    | 2    | max_leverage_bps
//! 226    | 2    | hf_floor_bps
//! 228    | 8    | oracle_stale_slots
//! 236    | 2    | oracle_divergence_bps
//! 238    | 2    | peg_warn_bps
//! 240    | 2    | peg_exit_bps
//! 242    | 2    | peg_panic_bps
//! 244    | 8    | cooldown_slots
//! 252    | 8    | reexpansion_delay_sec (i64)
//! 260    | 8    | last_rebalance_slot
//! 268    | 8    | reexpansion_unlocked_at (i64)
//! 276    | 1    | current_state
//! 277    | 8    | created_at (i64)
//! 285    | 1    | bump
//! 286    | 4    | keepers length
//! 290    | 32*n | keepers
//! ```

use std::fmt;

use solana_sdk::pubkey::Pubkey;

use super::SolanaClientError;

/// First 8 bytes of `sha256("account:Vault")`.
pub const VAULT_DISCRIMINATOR: [u8; 8] = [211, 8, 232, 43, 2, 152, 117, 119];

const KEEPERS_OFFSET: usize = 286;
const MIN_LEN: usize = KEEPERS_OFFSET + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskState {
    Loop,
    Contract,
    Exit,
    Panic,
}

impl RiskState {
    fn from_byte(b: u8) -> Result<Self, SolanaClientError> {
        match b {
            0 => Ok(RiskState::Loop),
            1 => Ok(RiskState::Contract),
            2 => Ok(RiskState::Exit),
            3 => Ok(RiskState::Panic),
            other => Err(SolanaClientError::Decode(format!("unknown vault state {}", other))),
        }
    }
}

impl fmt::Display for RiskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskState::Loop => "LOOP",
            RiskState::Contract => "CONTRACT",
            RiskState::Exit => "EXIT",
            RiskState::Panic => "PANIC",
        };
        f.write_str(s)
    }
}

/// The fields the keeper acts on.
#[derive(Debug, Clone)]
pub struct VaultSnapshot {
    pub authority: Pubkey,
    pub share_mint: Pubkey,
    pub primary_oracle: Pubkey,
    pub secondary_oracle: Pubkey,
    pub total_supplied: u64,
    pub total_borrowed: u64,
    pub total_shares: u64,
    pub max_leverage_bps: u16,
    pub hf_floor_bps: u16,
    pub cooldown_slots: u64,
    pub last_rebalance_slot: u64,
    pub reexpansion_unlocked_at: i64,
    pub current_state: RiskState,
    pub keepers: Vec<Pubkey>,
}

impl VaultSnapshot {
    pub fn from_account_data(data: &[u8]) -> Result<Self, SolanaClientError> {
        if data.len() < MIN_LEN {
            return Err(SolanaClientError::Decode("account data too short".to_string()));
        }
        if data[..8] != VAULT_DISCRIMINATOR {
            return Err(SolanaClientError::Decode("not a Vault account".to_string()));
        }

        let keeper_count = read_u32(data, KEEPERS_OFFSET)? as usize;
        let keepers = (0..keeper_count)
            .map(|i| read_pubkey(data, KEEPERS_OFFSET + 4 + 32 * i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            authority: read_pubkey(data, 8)?,
            share_mint: read_pubkey(data, 104)?,
            primary_oracle: read_pubkey(data, 136)?,
            secondary_oracle: read_pubkey(data, 168)?,
            total_supplied: read_u64(data, 200)?,
            total_borrowed: read_u64(data, 208)?,
            total_shares: read_u64(data, 216)?,
            max_leverage_bps: read_u16(data, 224)?,
            hf_floor_bps: read_u16(data, 226)?,
            cooldown_slots: read_u64(data, 244)?,
            last_rebalance_slot: read_u64(data, 260)?,
            reexpansion_unlocked_at: read_u64(data, 268)? as i64,
            current_state: RiskState::from_byte(data[276])?,
            keepers,
        })
    }

    pub fn equity(&self) -> u64 {
        self.total_supplied.saturating_sub(self.total_borrowed)
    }

    /// `None` when equity is zero.
    pub fn leverage_bps(&self) -> Option<u64> {
        let equity = self.equity();
        (equity > 0).then(|| (self.total_supplied as u128 * 10_000 / equity as u128) as u64)
    }

    /// `None` (infinite) when nothing is borrowed.
    pub fn health_factor_bps(&self) -> Option<u64> {
        (self.total_borrowed > 0)
            .then(|| (self.equity() as u128 * 10_000 / self.total_borrowed as u128) as u64)
    }

    pub fn is_keeper(&self, key: &Pubkey) -> bool {
        self.authority == *key || self.keepers.contains(key)
    }

    /// Slots until the program will accept another rebalance; 0 when ready.
    pub fn cooldown_remaining(&self, current_slot: u64) -> u64 {
        let elapsed = current_slot.saturating_sub(self.last_rebalance_slot);
        self.cooldown_slots.saturating_sub(elapsed)
    }
}

fn field<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], SolanaClientError> {
    data.get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| SolanaClientError::Decode(format!("truncated field at offset {}", offset)))
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16, SolanaClientError> {
    Ok(u16::from_le_bytes(field(data, offset)?))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, SolanaClientError> {
    Ok(u32::from_le_bytes(field(data, offset)?))
}

fn read_u64(data: &[u8], offset: usize) -> Result<u64, SolanaClientError> {
    Ok(u64::from_le_bytes(field(data, offset)?))
}

fn read_pubkey(data: &[u8], offset: usize) -> Result<Pubkey, SolanaClientError> {
    Ok(Pubkey::new_from_array(field(data, offset)?))
}
