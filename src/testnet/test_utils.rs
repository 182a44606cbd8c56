//! Test utilities for ledger testing

use crate::config::ChainConfig;
use crate::core::{
    Amount, Block, BlockAssembler, Blockchain, Difficulty, Ledger, ProofOfWork, Transaction,
    GENESIS_PREVIOUS_HASH,
};
use crate::storage::InMemoryRepository;
use crate::utils::current_timestamp;
use crate::wallet::{seed_accounts, WalletId};

/// One hex digit: about 16 attempts per block
pub const TEST_DIFFICULTY: &str = "0";

/// Transfer between two fresh wallets; only the size matters to most tests
pub fn test_transfer(size: u64) -> Transaction {
    Transaction::new_transfer(
        WalletId::new(),
        WalletId::new(),
        Amount::from_coins(1),
        None,
        size,
    )
    .unwrap()
}

/// Unmined genesis-position block carrying one transfer
pub fn create_test_block(difficulty: &str) -> Block {
    Block::new_block(
        0,
        GENESIS_PREVIOUS_HASH,
        vec![test_transfer(100)],
        current_timestamp(),
        "0.1",
        difficulty,
    )
    .unwrap()
}

pub fn test_assembler() -> BlockAssembler {
    BlockAssembler::new("0.1", Difficulty::new(TEST_DIFFICULTY).unwrap())
}

/// Assemble against the tail of `ledger` and mine, ready to append
pub fn mine_test_block(ledger: &Ledger, transactions: Vec<Transaction>) -> Block {
    let block = test_assembler().assemble(transactions, ledger).unwrap();
    ProofOfWork::new(Difficulty::new(TEST_DIFFICULTY).unwrap())
        .mine(block)
        .unwrap()
}

/// Defaults with an easy difficulty and a small supply
pub fn test_config() -> ChainConfig {
    ChainConfig {
        difficulty: Difficulty::new(TEST_DIFFICULTY).unwrap(),
        supply_limit: Amount::from_coins(10_000),
        max_attempts: 100_000,
        ..ChainConfig::default()
    }
}

/// Chain over a seeded in-memory repository, plus the users' spending wallets
pub fn test_chain(users: usize, miners: usize) -> (Blockchain<InMemoryRepository>, Vec<WalletId>) {
    test_chain_with(test_config(), users, miners)
}

pub fn test_chain_with(
    config: ChainConfig,
    users: usize,
    miners: usize,
) -> (Blockchain<InMemoryRepository>, Vec<WalletId>) {
    let mut repository = InMemoryRepository::new();
    let seeded = seed_accounts(&mut repository, users, miners).unwrap();
    let wallets = seeded.users.iter().map(|w| w.get_id()).collect();
    (Blockchain::new(repository, config).unwrap(), wallets)
}
