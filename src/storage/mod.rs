//! Data storage
//!
//! This module holds the pool of pending transactions and the repository
//! contract through which the miner loop reaches users, wallets and miners.

pub mod memory_pool;
pub mod repository;

pub use memory_pool::MemoryPool;
pub use repository::{InMemoryRepository, Repository};
