//! # Services Module
//!
//! | Service | Responsibility |
//! |---------|---------------|
//! | `RebalanceKeeper` | Poll the vault, submit `rebalance` when due |
//! | `transaction_builder` | Assemble raw program instructions |

pub mod rebalance_keeper;
pub mod transaction_builder;

pub use rebalance_keeper::{load_keypair, RebalanceKeeper};
