//! # Transaction Builder
//!
//! Hand-assembles aegis-vault instructions without the Anchor client.
//!
//! ```text
//! Instruction
//! ├── Program ID
//! ├── Accounts[]   (order must match the program's Accounts struct)
//! └── Data         (8-byte discriminator + borsh args)
//! ```

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

/// First 8 bytes of `sha256("global:rebalance")`.
pub const REBALANCE_DISCRIMINATOR: [u8; 8] = [108, 158, 77, 9, 210, 52, 88, 62];

pub const VAULT_SEED: &[u8] = b"vault";

pub fn find_vault_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[VAULT_SEED], program_id).0
}

/// `rebalance` takes no arguments, so the data is the discriminator alone.
///
/// Accounts, in order: keeper (signer, writable), vault (writable),
/// primary oracle, secondary oracle.
pub fn build_rebalance_instruction(
    program_id: &Pubkey,
    keeper: &Pubkey,
    vault: &Pubkey,
    primary_oracle: &Pubkey,
    secondary_oracle: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*keeper, true),
            AccountMeta::new(*vault, false),
            AccountMeta::new_readonly(*primary_oracle, false),
            AccountMeta::new_readonly(*secondary_oracle, false),
        ],
        data: REBALANCE_DISCRIMINATOR.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebalance_instruction_layout() {
        let program_id = Pubkey::new_unique();
        let keeper = Pubkey::new_unique();
        let vault = find_vault_address(&program_id);
        let primary = Pubkey::new_unique();
        let secondary = Pubkey::new_unique();

        let ix = build_rebalance_instruction(&program_id, &keeper, &vault, &primary, &secondary);

        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.data, REBALANCE_DISCRIMINATOR.to_vec());
        assert_eq!(ix.accounts.len(), 4);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[1].pubkey, vault);
        assert!(ix.accounts[1].is_writable && !ix.accounts[1].is_signer);
        assert!(!ix.accounts[2].is_writable);
        assert_eq!(ix.accounts[3].pubkey, secondary);
    }

    #[test]
    fn test_vault_address_is_deterministic() {
        let program_id = Pubkey::new_unique();
        assert_eq!(find_vault_address(&program_id), find_vault_address(&program_id));
        assert_ne!(find_vault_address(&program_id), find_vault_address(&Pubkey::new_unique()));
    }
}
