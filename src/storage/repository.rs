//! Repository contract consumed by the ledger core.
//!
//! The core never owns users, wallets or miners; it asks a [`Repository`] for
//! them and pushes pending transactions through the pool operations.
//! [`InMemoryRepository`] backs the demo binary and the tests.

use crate::core::Transaction;
use crate::error::{LedgerError, Result};
use crate::storage::MemoryPool;
use crate::wallet::{Miner, User, UserId, Wallet, WalletId};
use log::debug;
use uuid::Uuid;

/// Persistence collaborator for the miner loop.
pub trait Repository {
    fn pool_add(&self, tx: Transaction) -> Result<()>;

    /// Remove-or-fail: returns the transaction only to the first caller.
    fn pool_remove(&self, id: Uuid) -> Result<Transaction>;

    fn pool_all(&self) -> Vec<Transaction>;

    fn users_all(&self) -> Vec<User>;

    fn wallets_all(&self) -> Vec<Wallet>;

    /// The user's spending wallet, i.e. the first wallet they own that is not
    /// a miner wallet.
    fn wallet_for_user(&self, user_id: UserId) -> Result<Wallet>;

    fn miners_all(&self) -> Vec<Miner>;

    /// The account that holds the undistributed supply.
    fn genesis_user(&self) -> Result<User>;
}

#[derive(Default)]
pub struct InMemoryRepository {
    pool: MemoryPool,
    users: Vec<User>,
    wallets: Vec<Wallet>,
    miners: Vec<Miner>,
}

impl InMemoryRepository {
    pub fn new() -> InMemoryRepository {
        InMemoryRepository::default()
    }

    /// Register a user together with their spending wallet.
    pub fn add_user(&mut self, user: User) -> Wallet {
        let wallet = Wallet::new(user.get_id());
        debug!("Registered user {} with wallet {}", user.full_name(), wallet.get_id());
        self.users.push(user);
        self.wallets.push(wallet.clone());
        wallet
    }

    /// Give an existing user a second wallet that receives mining rewards.
    pub fn add_miner(&mut self, user_id: UserId) -> Result<Miner> {
        if !self.users.iter().any(|u| u.get_id() == user_id) {
            return Err(LedgerError::Repository(format!("Unknown user {user_id}")));
        }
        let wallet = Wallet::new(user_id);
        let miner = Miner::new(wallet.get_id());
        debug!("Registered miner {} with wallet {}", miner.get_id(), wallet.get_id());
        self.wallets.push(wallet);
        self.miners.push(miner.clone());
        Ok(miner)
    }

    pub fn get_pool(&self) -> &MemoryPool {
        &self.pool
    }

    fn is_miner_wallet(&self, wallet_id: WalletId) -> bool {
        self.miners.iter().any(|m| m.get_wallet_id() == wallet_id)
    }
}

impl Repository for InMemoryRepository {
    fn pool_add(&self, tx: Transaction) -> Result<()> {
        self.pool.add(tx)
    }

    fn pool_remove(&self, id: Uuid) -> Result<Transaction> {
        self.pool.take(id)
    }

    fn pool_all(&self) -> Vec<Transaction> {
        self.pool.get_all()
    }

    fn users_all(&self) -> Vec<User> {
        self.users.clone()
    }

    fn wallets_all(&self) -> Vec<Wallet> {
        self.wallets.clone()
    }

    fn wallet_for_user(&self, user_id: UserId) -> Result<Wallet> {
        self.wallets
            .iter()
            .find(|w| w.get_user_id() == user_id && !self.is_miner_wallet(w.get_id()))
            .cloned()
            .ok_or_else(|| LedgerError::Repository(format!("User {user_id} has no wallet")))
    }

    fn miners_all(&self) -> Vec<Miner> {
        self.miners.clone()
    }

    fn genesis_user(&self) -> Result<User> {
        self.users
            .iter()
            .find(|u| u.is_genesis())
            .cloned()
            .ok_or_else(|| LedgerError::Repository("No genesis user registered".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::test_transfer;

    #[test]
    fn test_wallet_for_user_skips_miner_wallet() {
        let mut repo = InMemoryRepository::new();
        let user = User::new("Grace", "Hopper");
        let user_id = user.get_id();
        let spending = repo.add_user(user);
        let miner = repo.add_miner(user_id).unwrap();

        assert_eq!(repo.wallets_all().len(), 2);
        assert_eq!(repo.wallet_for_user(user_id).unwrap(), spending);
        assert_ne!(miner.get_wallet_id(), spending.get_id());
    }

    #[test]
    fn test_unknown_user() {
        let mut repo = InMemoryRepository::new();
        assert!(repo.wallet_for_user(UserId::new()).is_err());
        assert!(repo.add_miner(UserId::new()).is_err());
        assert!(repo.genesis_user().is_err());
    }

    #[test]
    fn test_genesis_user_lookup() {
        let mut repo = InMemoryRepository::new();
        repo.add_user(User::new("Ada", "Lovelace"));
        repo.add_user(User::genesis());
        assert!(repo.genesis_user().unwrap().is_genesis());
    }

    #[test]
    fn test_pool_contract() {
        let repo = InMemoryRepository::new();
        let tx = test_transfer(10);
        let id = tx.get_id();

        repo.pool_add(tx).unwrap();
        assert_eq!(repo.pool_all().len(), 1);
        assert!(repo.pool_remove(id).is_ok());
        assert!(repo.pool_remove(id).is_err());
        assert!(repo.get_pool().is_empty());
    }
}
