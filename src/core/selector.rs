// Greedy bin-packing of pending transactions into one block.
//
// Working order: aged transactions first (oldest first), then the rest by
// size descending. Ties fall back to the older timestamp, then the id, so the
// same pool always yields the same selection.

use crate::core::Transaction;
use crate::error::{LedgerError, Result};
use crate::storage::Repository;
use crate::utils::months_before;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::collections::VecDeque;

/// Outcome of one selection round
#[derive(Debug, Clone, Default)]
pub struct Selection {
    selected: Vec<Transaction>,
    skipped: Vec<Transaction>, // larger than a whole block; left in the pool
}

impl Selection {
    pub fn get_selected(&self) -> &[Transaction] {
        &self.selected
    }

    pub fn get_skipped(&self) -> &[Transaction] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.selected.iter().map(Transaction::get_size).sum()
    }

    /// One `OversizedTransaction` per skipped transaction.
    pub fn skipped_errors(&self, capacity: u64) -> Vec<LedgerError> {
        self.skipped
            .iter()
            .map(|tx| LedgerError::OversizedTransaction {
                id: tx.get_id(),
                size: tx.get_size(),
                capacity,
            })
            .collect()
    }

    pub fn into_parts(self) -> (Vec<Transaction>, Vec<Transaction>) {
        (self.selected, self.skipped)
    }

    /// Put every selected transaction back into the pool.
    pub fn rollback<R: Repository + ?Sized>(self, repository: &R) -> Result<()> {
        let count = self.selected.len();
        for tx in self.selected {
            repository.pool_add(tx)?;
        }
        info!("Rolled back {count} transactions to the pool");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PoolSelector {
    capacity: u64,
    aged_after_months: u32,
}

impl PoolSelector {
    pub fn new(capacity: u64, aged_after_months: u32) -> PoolSelector {
        PoolSelector {
            capacity,
            aged_after_months,
        }
    }

    pub fn get_capacity(&self) -> u64 {
        self.capacity
    }

    fn by_age(a: &Transaction, b: &Transaction) -> Ordering {
        a.get_timestamp()
            .cmp(&b.get_timestamp())
            .then_with(|| a.get_id().cmp(&b.get_id()))
    }

    fn by_size_descending(a: &Transaction, b: &Transaction) -> Ordering {
        b.get_size()
            .cmp(&a.get_size())
            .then_with(|| Self::by_age(a, b))
    }

    /// Working list for a pool snapshot plus the transactions that can never
    /// fit in a block.
    pub fn order(
        &self,
        snapshot: Vec<Transaction>,
        now: DateTime<Utc>,
    ) -> (Vec<Transaction>, Vec<Transaction>) {
        let cutoff = months_before(now, self.aged_after_months);

        let (oversized, candidates): (Vec<Transaction>, Vec<Transaction>) = snapshot
            .into_iter()
            .partition(|tx| tx.get_size() > self.capacity);
        let (mut aged, mut recent): (Vec<Transaction>, Vec<Transaction>) = candidates
            .into_iter()
            .partition(|tx| tx.get_timestamp() < cutoff);

        aged.sort_by(Self::by_age);
        recent.sort_by(Self::by_size_descending);
        aged.extend(recent);
        (aged, oversized)
    }

    /// Select transactions for the next block, taking each one out of the
    /// pool as it is accepted.
    pub fn select_for_block<R: Repository + ?Sized>(
        &self,
        repository: &R,
        now: DateTime<Utc>,
    ) -> Result<Selection> {
        let (working, skipped) = self.order(repository.pool_all(), now);
        for tx in &skipped {
            warn!(
                "{}",
                LedgerError::OversizedTransaction {
                    id: tx.get_id(),
                    size: tx.get_size(),
                    capacity: self.capacity,
                }
            );
        }

        let mut working: VecDeque<Transaction> = working.into();
        let mut remaining = self.capacity;
        let mut selected = Vec::new();

        while let Some(head) = working.pop_front() {
            if remaining == 0 {
                break;
            }
            if head.get_size() <= remaining {
                match repository.pool_remove(head.get_id()) {
                    Ok(tx) => {
                        remaining -= tx.get_size();
                        selected.push(tx);
                    }
                    // someone else took it between snapshot and removal
                    Err(e) => debug!("Skipping {}: {e}", head.get_id()),
                }
            } else {
                working.retain(|tx| tx.get_size() <= remaining);
                if working.is_empty() {
                    break;
                }
            }
        }

        let selection = Selection { selected, skipped };
        info!(
            "Selected {} transactions ({} of {} bytes), skipped {} oversized",
            selection.selected.len(),
            selection.total_size(),
            self.capacity,
            selection.skipped.len()
        );
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRepository;
    use crate::testnet::test_transfer;
    use crate::utils::current_timestamp;
    use chrono::Duration;

    fn repository_with(txs: &[Transaction]) -> InMemoryRepository {
        let repository = InMemoryRepository::new();
        for tx in txs {
            repository.pool_add(tx.clone()).unwrap();
        }
        repository
    }

    fn sizes(txs: &[Transaction]) -> Vec<u64> {
        txs.iter().map(Transaction::get_size).collect()
    }

    #[test]
    fn test_single_oversized_transaction_is_excluded() {
        let big = test_transfer(2_000_000);
        let repository = repository_with(&[big.clone()]);

        let selection = PoolSelector::new(1_000_000, 3)
            .select_for_block(&repository, current_timestamp())
            .unwrap();

        assert!(selection.is_empty());
        assert_eq!(selection.get_skipped(), &[big.clone()]);
        assert_eq!(
            selection.skipped_errors(1_000_000),
            vec![LedgerError::OversizedTransaction {
                id: big.get_id(),
                size: 2_000_000,
                capacity: 1_000_000
            }]
        );
        // still pending, not silently dropped
        assert_eq!(repository.pool_all().len(), 1);
    }

    #[test]
    fn test_largest_first_then_fit() {
        let repository = repository_with(&[test_transfer(300), test_transfer(800)]);

        let selection = PoolSelector::new(1000, 3)
            .select_for_block(&repository, current_timestamp())
            .unwrap();

        assert_eq!(sizes(selection.get_selected()), vec![800]);
        assert_eq!(sizes(&repository.pool_all()), vec![300]);
    }

    #[test]
    fn test_smaller_transactions_fill_the_gap() {
        let repository = repository_with(&[
            test_transfer(600),
            test_transfer(500),
            test_transfer(300),
            test_transfer(100),
        ]);

        let selection = PoolSelector::new(1000, 3)
            .select_for_block(&repository, current_timestamp())
            .unwrap();

        // 600 taken, 500 no longer fits, 300 and 100 fill the rest
        assert_eq!(sizes(selection.get_selected()), vec![600, 300, 100]);
        assert_eq!(selection.total_size(), 1000);
        assert_eq!(sizes(&repository.pool_all()), vec![500]);
    }

    #[test]
    fn test_aged_transactions_go_first() {
        let now = current_timestamp();
        let old = test_transfer(100).with_timestamp(now - Duration::days(200));
        let repository = repository_with(&[test_transfer(900), old.clone()]);

        let selection = PoolSelector::new(950, 3)
            .select_for_block(&repository, now)
            .unwrap();

        // size ordering alone would have picked the 900 byte transaction
        assert_eq!(selection.get_selected(), &[old]);
    }

    #[test]
    fn test_aged_transactions_oldest_first() {
        let now = current_timestamp();
        let older = test_transfer(10).with_timestamp(now - Duration::days(400));
        let newer = test_transfer(500).with_timestamp(now - Duration::days(100));
        let selector = PoolSelector::new(1000, 3);

        let (working, skipped) = selector.order(vec![newer.clone(), older.clone()], now);
        assert_eq!(working, vec![older, newer]);
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_ordering_is_deterministic() {
        let now = current_timestamp();
        let txs: Vec<Transaction> = (0..6)
            .map(|_| test_transfer(100).with_timestamp(now))
            .collect();
        let selector = PoolSelector::new(1000, 3);

        let (forward, _) = selector.order(txs.clone(), now);
        let mut reversed = txs;
        reversed.reverse();
        let (backward, _) = selector.order(reversed, now);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_empty_pool() {
        let repository = InMemoryRepository::new();
        let selection = PoolSelector::new(1000, 3)
            .select_for_block(&repository, current_timestamp())
            .unwrap();
        assert!(selection.is_empty());
        assert!(selection.get_skipped().is_empty());
    }

    #[test]
    fn test_rollback_returns_transactions() {
        let repository = repository_with(&[test_transfer(300), test_transfer(400)]);
        let selection = PoolSelector::new(1000, 3)
            .select_for_block(&repository, current_timestamp())
            .unwrap();
        assert_eq!(selection.get_selected().len(), 2);
        assert!(repository.pool_all().is_empty());

        selection.rollback(&repository).unwrap();
        assert_eq!(repository.pool_all().len(), 2);
    }

    #[test]
    fn test_selection_is_never_repeated() {
        let repository = repository_with(&[test_transfer(300)]);
        let selector = PoolSelector::new(1000, 3);

        let first = selector
            .select_for_block(&repository, current_timestamp())
            .unwrap();
        let second = selector
            .select_for_block(&repository, current_timestamp())
            .unwrap();
        assert_eq!(first.get_selected().len(), 1);
        assert!(second.is_empty());
    }
}
