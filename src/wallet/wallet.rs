// Users, wallets and miners are owned by the persistence collaborator.
// The ledger core only ever sees a WalletId, which it uses as an aggregation key.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Given and family name of the account that issues the genesis supply
pub const GENESIS_GIVEN_NAME: &str = "Network";
pub const GENESIS_FAMILY_NAME: &str = "Admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WalletId(Uuid);

impl WalletId {
    pub fn new() -> WalletId {
        WalletId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WalletId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for WalletId {
    fn from(id: Uuid) -> Self {
        WalletId(id)
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> UserId {
        UserId(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    given_name: String,
    family_name: String,
}

impl User {
    pub fn new(given_name: &str, family_name: &str) -> User {
        User {
            id: UserId::new(),
            given_name: given_name.to_string(),
            family_name: family_name.to_string(),
        }
    }

    pub fn genesis() -> User {
        User::new(GENESIS_GIVEN_NAME, GENESIS_FAMILY_NAME)
    }

    pub fn get_id(&self) -> UserId {
        self.id
    }

    pub fn get_given_name(&self) -> &str {
        &self.given_name
    }

    pub fn get_family_name(&self) -> &str {
        &self.family_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }

    pub fn is_genesis(&self) -> bool {
        self.given_name == GENESIS_GIVEN_NAME && self.family_name == GENESIS_FAMILY_NAME
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    id: WalletId,
    user_id: UserId,
}

impl Wallet {
    pub fn new(user_id: UserId) -> Wallet {
        Wallet {
            id: WalletId::new(),
            user_id,
        }
    }

    pub fn get_id(&self) -> WalletId {
        self.id
    }

    pub fn get_user_id(&self) -> UserId {
        self.user_id
    }
}

/// A mining identity. Rewards are paid into `wallet_id`, which belongs to a
/// user alongside that user's spending wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Miner {
    id: Uuid,
    wallet_id: WalletId,
}

impl Miner {
    pub fn new(wallet_id: WalletId) -> Miner {
        Miner {
            id: Uuid::new_v4(),
            wallet_id,
        }
    }

    pub fn get_id(&self) -> Uuid {
        self.id
    }

    pub fn get_wallet_id(&self) -> WalletId {
        self.wallet_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_user_is_recognised() {
        assert!(User::genesis().is_genesis());
        assert!(!User::new("Ada", "Lovelace").is_genesis());
    }

    #[test]
    fn test_wallet_ids_are_unique() {
        let user = User::new("Ada", "Lovelace");
        let a = Wallet::new(user.get_id());
        let b = Wallet::new(user.get_id());
        assert_ne!(a.get_id(), b.get_id());
        assert_eq!(a.get_user_id(), b.get_user_id());
    }
}
