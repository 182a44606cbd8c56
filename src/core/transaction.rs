// A transaction moves a fixed-point amount from one wallet to another.
// It is immutable once created: it sits in the pool, is consumed exactly once
// into a block, and is never changed afterwards.

use crate::core::Amount;
use crate::error::{LedgerError, Result};
use crate::utils::{current_timestamp, hash};
use crate::wallet::WalletId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Tag written first in every canonical transaction serialization
pub const TRANSACTION_FORMAT_VERSION: &str = "tx-v1";

/// Size used for transactions the chain produces itself (distribution, rewards)
pub const STANDARD_TRANSACTION_SIZE: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Mints the supply into the genesis wallet; has no source
    Issuance,
    /// Ordinary wallet-to-wallet transfer
    Transfer,
    /// Block reward paid from the genesis wallet to a miner
    Reward,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Issuance => write!(f, "issuance"),
            TransactionKind::Transfer => write!(f, "transfer"),
            TransactionKind::Reward => write!(f, "reward"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: Uuid,
    source: Option<WalletId>, // None only for the genesis issuance
    destination: WalletId,
    amount: Amount,
    fee: Option<Amount>,
    timestamp: DateTime<Utc>,
    size: u64, // bytes, counted against the block capacity
    kind: TransactionKind,
}

impl Transaction {
    /// The one transaction that creates money: the whole supply, credited to
    /// the genesis wallet.
    pub fn new_issuance(destination: WalletId, supply: Amount, size: u64) -> Result<Transaction> {
        if !supply.is_positive() {
            return Err(LedgerError::InvalidTransaction(
                "Issued supply must be positive".to_string(),
            ));
        }
        Ok(Self::build(
            None,
            destination,
            supply,
            None,
            size,
            TransactionKind::Issuance,
        ))
    }

    pub fn new_transfer(
        source: WalletId,
        destination: WalletId,
        amount: Amount,
        fee: Option<Amount>,
        size: u64,
    ) -> Result<Transaction> {
        Self::validate_transfer(source, destination, amount, fee)?;
        Ok(Self::build(
            Some(source),
            destination,
            amount,
            fee,
            size,
            TransactionKind::Transfer,
        ))
    }

    pub fn new_reward(
        source: WalletId,
        miner_wallet: WalletId,
        reward: Amount,
        size: u64,
    ) -> Result<Transaction> {
        Self::validate_transfer(source, miner_wallet, reward, None)?;
        Ok(Self::build(
            Some(source),
            miner_wallet,
            reward,
            None,
            size,
            TransactionKind::Reward,
        ))
    }

    fn validate_transfer(
        source: WalletId,
        destination: WalletId,
        amount: Amount,
        fee: Option<Amount>,
    ) -> Result<()> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidTransaction(format!(
                "Amount must be positive, got {amount}"
            )));
        }
        if source == destination {
            return Err(LedgerError::InvalidTransaction(format!(
                "Source and destination are the same wallet: {source}"
            )));
        }
        if let Some(fee) = fee {
            if fee.is_negative() {
                return Err(LedgerError::InvalidTransaction(format!(
                    "Fee must not be negative, got {fee}"
                )));
            }
        }
        Ok(())
    }

    fn build(
        source: Option<WalletId>,
        destination: WalletId,
        amount: Amount,
        fee: Option<Amount>,
        size: u64,
        kind: TransactionKind,
    ) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            source,
            destination,
            amount,
            fee,
            timestamp: current_timestamp(),
            size,
            kind,
        }
    }

    /// Backdates or postdates a transaction before it is submitted anywhere.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Transaction {
        self.timestamp = timestamp;
        self
    }

    pub fn get_id(&self) -> Uuid {
        self.id
    }

    pub fn get_source(&self) -> Option<WalletId> {
        self.source
    }

    pub fn get_destination(&self) -> WalletId {
        self.destination
    }

    pub fn get_amount(&self) -> Amount {
        self.amount
    }

    pub fn get_fee(&self) -> Option<Amount> {
        self.fee
    }

    pub fn get_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn get_size(&self) -> u64 {
        self.size
    }

    pub fn get_kind(&self) -> TransactionKind {
        self.kind
    }

    /// What the source wallet gives up: the amount plus any fee.
    pub fn total_debit(&self) -> Amount {
        self.amount + self.fee.unwrap_or(Amount::ZERO)
    }

    /// Field order: version, id, source, destination, amount units, fee
    /// units, timestamp millis, size, kind. Absent values are written as `-`.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let source = self
            .source
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let fee = self
            .fee
            .map(|f| f.units().to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}",
            TRANSACTION_FORMAT_VERSION,
            self.id,
            source,
            self.destination,
            self.amount.units(),
            fee,
            self.timestamp.timestamp_millis(),
            self.size,
            self.kind
        )
        .into_bytes()
    }

    /// Merkle leaf for this transaction.
    pub fn fingerprint(&self) -> String {
        hash(&self.canonical_bytes())
    }
}
