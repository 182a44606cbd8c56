//! Users, wallets and miners
//!
//! These records belong to the persistence collaborator. The ledger core
//! only uses a [`WalletId`] as a key for balance aggregation.

#[allow(clippy::module_inception)]
pub mod wallet;
pub mod wallets;

pub use wallet::{
    Miner, User, UserId, Wallet, WalletId, GENESIS_FAMILY_NAME, GENESIS_GIVEN_NAME,
};
pub use wallets::{seed_accounts, SeededAccounts};
