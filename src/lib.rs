//! # Ox Ledger - A Single-Process Proof-of-Work Ledger
//!
//! An append-only chain of blocks, each holding a batch of transactions picked
//! from a pending pool, committed to by a Merkle root and sealed by a hash
//! that starts with a difficulty prefix.
//!
//! ## What It Does
//! - **Hashing**: double SHA-256, rendered as zero-padded lowercase hex
//! - **Merkle Trees**: ordered pairwise roots plus inclusion proofs
//! - **Proof-of-Work**: nonce search from 0 with an iteration ceiling and a cancellation flag
//! - **Pool Selection**: aged transactions first, then greedy largest-first bin-packing
//! - **Ledger**: compare-and-append on position, running balance index
//! - **Balances**: verified (ledger) and unverified (pool) per wallet
//!
//! ## How The Code Is Organized
//! - `core/`: blocks, transactions, mining, selection, the ledger and the miner loop
//! - `storage/`: the transaction pool and the repository contract
//! - `wallet/`: users, wallets, miners and demo seeding
//! - `config/`: chain settings from defaults, TOML and environment
//! - `utils/`: the hashing primitive and time helpers
//! - `cli/`: argument definitions for the demo binary
//!
//! ## Where To Start
//! 1. `core/blockchain.rs` runs one round: select, assemble, mine, append
//! 2. `core/selector.rs` decides what goes into a block
//! 3. `core/ledger.rs` guards positions and linkage

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::ChainConfig;
pub use core::{
    Amount, Balance, BalanceResolver, Block, BlockAssembler, BlockHeader, BlockState, Blockchain,
    Difficulty, Ledger, MerkleProof, MerkleTree, MinedBlock, PoolSelector, ProofOfWork, RoundOutcome, Selection,
    Transaction, TransactionKind, GENESIS_PREVIOUS_HASH,
};
pub use error::{LedgerError, Result};
pub use storage::{InMemoryRepository, MemoryPool, Repository};
pub use utils::{current_timestamp, hash, hash_pair, sha256_digest};
pub use wallet::{seed_accounts, Miner, SeededAccounts, User, UserId, Wallet, WalletId};
