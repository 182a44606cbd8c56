// Verified balances come from appended blocks, unverified ones from the pool.
// Sources pay amount plus fee; fees are not credited to anyone.

use crate::core::{Amount, Ledger, Transaction};
use crate::wallet::WalletId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Settled and pending balance of one wallet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub verified: Amount,
    pub unverified: Amount,
}

impl Balance {
    /// Balance once every pending transaction is mined.
    pub fn projected(&self) -> Amount {
        self.verified + self.unverified
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pending {})", self.verified, self.unverified)
    }
}

/// Signed effect of `tx` on `wallet`.
pub fn transaction_delta(tx: &Transaction, wallet: WalletId) -> Amount {
    let mut delta = Amount::ZERO;
    if tx.get_destination() == wallet {
        delta += tx.get_amount();
    }
    if tx.get_source() == Some(wallet) {
        delta -= tx.total_debit();
    }
    delta
}

/// Fold one transaction into a wallet-keyed running index.
pub(crate) fn apply_transaction(index: &mut HashMap<WalletId, Amount>, tx: &Transaction) {
    *index.entry(tx.get_destination()).or_default() += tx.get_amount();
    if let Some(source) = tx.get_source() {
        *index.entry(source).or_default() -= tx.total_debit();
    }
}

pub struct BalanceResolver;

impl BalanceResolver {
    /// Full scan of the ledger and the pool. O(chain size + pool size) per
    /// wallet; kept as the reference computation for the index.
    pub fn scan(wallet: WalletId, ledger: &Ledger, pool: &[Transaction]) -> Balance {
        let verified = ledger
            .iter()
            .flat_map(|block| block.get_transactions())
            .map(|tx| transaction_delta(tx, wallet))
            .sum();
        Balance {
            verified,
            unverified: Self::pending(wallet, pool),
        }
    }

    /// Verified part from the ledger's running index, pending part from the
    /// pool.
    pub fn indexed(wallet: WalletId, ledger: &Ledger, pool: &[Transaction]) -> Balance {
        Balance {
            verified: ledger.indexed_balance(wallet),
            unverified: Self::pending(wallet, pool),
        }
    }

    pub fn pending(wallet: WalletId, pool: &[Transaction]) -> Amount {
        pool.iter().map(|tx| transaction_delta(tx, wallet)).sum()
    }

    /// Sum of every verified balance in the chain.
    pub fn total_verified(ledger: &Ledger) -> Amount {
        let mut index = HashMap::new();
        for tx in ledger.iter().flat_map(|block| block.get_transactions()) {
            apply_transaction(&mut index, tx);
        }
        index.values().copied().sum()
    }

    /// Fees paid by every appended transaction.
    pub fn total_fees(ledger: &Ledger) -> Amount {
        ledger
            .iter()
            .flat_map(|block| block.get_transactions())
            .filter_map(Transaction::get_fee)
            .sum()
    }
}
