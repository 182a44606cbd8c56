use crate::core::Transaction;
use crate::error::{LedgerError, Result};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Pending transactions not yet included in any block
///
/// ( K -> transaction id, V => Transaction )
pub struct MemoryPool {
    inner: RwLock<HashMap<Uuid, Transaction>>,
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPool {
    pub fn new() -> MemoryPool {
        MemoryPool {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.get(&id).cloned(),
            Err(_) => {
                log::error!("Failed to acquire read lock on memory pool");
                None
            }
        }
    }

    pub fn add(&self, tx: Transaction) -> Result<()> {
        match self.inner.write() {
            Ok(mut pool) => {
                pool.insert(tx.get_id(), tx);
                Ok(())
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on memory pool");
                Err(LedgerError::Repository(
                    "memory pool lock poisoned".to_string(),
                ))
            }
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        match self.inner.read() {
            Ok(pool) => pool.contains_key(&id),
            Err(_) => {
                log::error!("Failed to acquire read lock on memory pool");
                false
            }
        }
    }

    /// Remove-or-fail: exactly one caller gets the transaction back, every
    /// later caller gets an error.
    pub fn take(&self, id: Uuid) -> Result<Transaction> {
        match self.inner.write() {
            Ok(mut pool) => pool.remove(&id).ok_or_else(|| {
                LedgerError::Repository(format!("Transaction {id} is not in the pool"))
            }),
            Err(_) => {
                log::error!("Failed to acquire write lock on memory pool");
                Err(LedgerError::Repository(
                    "memory pool lock poisoned".to_string(),
                ))
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(pool) => pool.len(),
            Err(_) => {
                log::error!("Failed to acquire read lock on memory pool");
                0
            }
        }
    }

    pub fn get_all(&self) -> Vec<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.values().cloned().collect(),
            Err(_) => {
                log::error!("Failed to acquire read lock on memory pool");
                Vec::new()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.inner.read() {
            Ok(pool) => pool.is_empty(),
            Err(_) => {
                log::error!("Failed to acquire read lock on memory pool");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::test_transfer;

    #[test]
    fn test_add_and_get_all() {
        let pool = MemoryPool::new();
        assert!(pool.is_empty());

        pool.add(test_transfer(10)).unwrap();
        pool.add(test_transfer(20)).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get_all().len(), 2);
    }

    #[test]
    fn test_take_is_remove_or_fail() {
        let pool = MemoryPool::new();
        let tx = test_transfer(10);
        let id = tx.get_id();
        pool.add(tx.clone()).unwrap();

        assert!(pool.contains(id));
        assert_eq!(pool.take(id).unwrap(), tx);
        assert!(!pool.contains(id));
        assert!(matches!(pool.take(id), Err(LedgerError::Repository(_))));
    }

    #[test]
    fn test_re_adding_same_transaction_is_idempotent() {
        let pool = MemoryPool::new();
        let tx = test_transfer(10);
        pool.add(tx.clone()).unwrap();
        pool.add(tx).unwrap();
        assert_eq!(pool.len(), 1);
    }
}
