//! Core ledger functionality
//!
//! This module contains the block-assembly and validation pipeline:
//! transactions and amounts, Merkle commitments, proof-of-work, pool
//! selection, the append-only ledger, balances and the miner loop.

pub mod assembler;
pub mod balance;
pub mod block;
pub mod blockchain;
pub mod ledger;
pub mod merkle;
pub mod monetary;
pub mod proof_of_work;
pub mod selector;
pub mod transaction;

pub use assembler::BlockAssembler;
pub use balance::{transaction_delta, Balance, BalanceResolver};
pub use block::{Block, BlockHeader, BlockState, GENESIS_PREVIOUS_HASH, HEADER_FORMAT_VERSION};
pub use blockchain::{Blockchain, MinedBlock, RoundOutcome};
pub use ledger::Ledger;
pub use merkle::{Fingerprint, MerkleProof, MerkleTree, ProofElement};
pub use monetary::{
    Amount, DECIMAL_PLACES, DEFAULT_GENESIS_TRANSFER, DEFAULT_MINER_REWARD, DEFAULT_SUPPLY_LIMIT,
    UNITS_PER_COIN,
};
pub use proof_of_work::{Difficulty, ProofOfWork, DEFAULT_DIFFICULTY};
pub use selector::{PoolSelector, Selection};
pub use transaction::{
    Transaction, TransactionKind, STANDARD_TRANSACTION_SIZE, TRANSACTION_FORMAT_VERSION,
};
