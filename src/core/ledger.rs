// The ledger is the append-only, positionally contiguous sequence of sealed blocks.
// ledger[i].position == i always holds; there is no deletion or reordering API.

use crate::core::balance::apply_transaction;
use crate::core::{Amount, Block, BlockState, ProofOfWork, GENESIS_PREVIOUS_HASH};
use crate::error::{LedgerError, Result};
use crate::wallet::WalletId;
use log::info;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    blocks: Vec<Block>,
    verified_balances: HashMap<WalletId, Amount>, // running index, updated per append
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Hash of the tail block. Callers building the genesis block must handle
    /// `EmptyChain` themselves.
    pub fn last_hash(&self) -> Result<&str> {
        self.blocks
            .last()
            .map(Block::get_hash)
            .ok_or(LedgerError::EmptyChain)
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn get(&self, position: usize) -> Option<&Block> {
        self.blocks.get(position)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Compare-and-append keyed on the block's position.
    ///
    /// A `PositionConflict` means the block was assembled against a stale
    /// tail; the caller must re-assemble and re-mine, never renumber.
    pub fn append(&mut self, mut block: Block) -> Result<()> {
        let expected = self.len();
        if block.get_position() != expected {
            return Err(LedgerError::PositionConflict {
                expected,
                found: block.get_position(),
            });
        }

        if block.get_state() != BlockState::Mined {
            return Err(LedgerError::InvalidBlock(format!(
                "Block at position {} is {}, only mined blocks can be appended",
                block.get_position(),
                block.get_state()
            )));
        }

        let tail_hash = self.last_hash().unwrap_or(GENESIS_PREVIOUS_HASH);
        if block.get_previous_hash() != tail_hash {
            return Err(LedgerError::InvalidBlock(format!(
                "Block at position {expected} references {} but the tail is {tail_hash}",
                block.get_previous_hash()
            )));
        }

        if !ProofOfWork::validate(&block) {
            return Err(LedgerError::InvalidBlock(format!(
                "Block at position {expected} has an invalid proof of work"
            )));
        }

        if !block.verify_merkle_root()? {
            return Err(LedgerError::InvalidBlock(format!(
                "Block at position {expected} has a Merkle root that does not match its transactions"
            )));
        }

        for tx in block.get_transactions() {
            apply_transaction(&mut self.verified_balances, tx);
        }

        block.mark_appended();
        info!(
            "Appended block {expected} ({} transactions, {} bytes): {}",
            block.get_transaction_count(),
            block.get_size(),
            block.get_hash()
        );
        self.blocks.push(block);
        Ok(())
    }

    /// Verified balance from the running index; no chain scan.
    pub fn indexed_balance(&self, wallet: WalletId) -> Amount {
        self.verified_balances
            .get(&wallet)
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    pub fn contains_transaction(&self, id: Uuid) -> bool {
        self.blocks
            .iter()
            .flat_map(Block::get_transactions)
            .any(|tx| tx.get_id() == id)
    }

    /// Re-check positions, linkage, proof of work and Merkle roots for the
    /// whole chain.
    pub fn verify_integrity(&self) -> Result<bool> {
        let mut previous_hash = GENESIS_PREVIOUS_HASH;

        for (position, block) in self.blocks.iter().enumerate() {
            if block.get_position() != position {
                return Ok(false);
            }
            if block.get_previous_hash() != previous_hash {
                return Ok(false);
            }
            if !ProofOfWork::validate(block) {
                return Ok(false);
            }
            if !block.verify_merkle_root()? {
                return Ok(false);
            }
            previous_hash = block.get_hash();
        }

        Ok(true)
    }
}
