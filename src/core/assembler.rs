use crate::core::{Block, Difficulty, Ledger, Transaction, GENESIS_PREVIOUS_HASH};
use crate::error::{LedgerError, Result};
use crate::utils::current_timestamp;
use log::debug;

/// Composes unmined blocks against the current ledger tail
#[derive(Debug, Clone)]
pub struct BlockAssembler {
    version: String,
    difficulty: Difficulty,
}

impl BlockAssembler {
    pub fn new(version: &str, difficulty: Difficulty) -> BlockAssembler {
        BlockAssembler {
            version: version.to_string(),
            difficulty,
        }
    }

    pub fn get_difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    /// Position is the ledger length; the previous hash is the tail's hash,
    /// or the all-zero constant when the ledger is still empty.
    pub fn assemble(&self, transactions: Vec<Transaction>, ledger: &Ledger) -> Result<Block> {
        let previous_hash = match ledger.last_hash() {
            Ok(hash) => hash.to_string(),
            Err(LedgerError::EmptyChain) => GENESIS_PREVIOUS_HASH.to_string(),
            Err(e) => return Err(e),
        };
        let position = ledger.len();

        let block = Block::new_block(
            position,
            &previous_hash,
            transactions,
            current_timestamp(),
            &self.version,
            self.difficulty.as_str(),
        )?;

        debug!(
            "Assembled block {position}: {} transactions, {} bytes, merkle root {}",
            block.get_transaction_count(),
            block.get_size(),
            block.get_merkle_root()
        );
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BlockState, ProofOfWork};
    use crate::testnet::{test_transfer, TEST_DIFFICULTY};
    use crate::utils::hash_pair;

    fn assembler() -> BlockAssembler {
        BlockAssembler::new("0.1", Difficulty::new(TEST_DIFFICULTY).unwrap())
    }

    #[test]
    fn test_genesis_assembly_uses_zero_hash() {
        let ledger = Ledger::new();
        let tx = test_transfer(10);
        let fp = tx.fingerprint();

        let block = assembler().assemble(vec![tx], &ledger).unwrap();
        assert_eq!(block.get_position(), 0);
        assert_eq!(block.get_previous_hash(), GENESIS_PREVIOUS_HASH);
        assert_eq!(block.get_merkle_root(), hash_pair(&fp, &fp));
        assert_eq!(block.get_header().get_version(), "0.1");
        assert_eq!(block.get_state(), BlockState::Created);
    }

    #[test]
    fn test_assembly_links_to_tail() {
        let mut ledger = Ledger::new();
        let assembler = assembler();
        let pow = ProofOfWork::new(assembler.get_difficulty().clone());

        let genesis = pow
            .mine(assembler.assemble(vec![test_transfer(1)], &ledger).unwrap())
            .unwrap();
        let genesis_hash = genesis.get_hash().to_string();
        ledger.append(genesis).unwrap();

        let next = assembler
            .assemble(vec![test_transfer(300), test_transfer(700)], &ledger)
            .unwrap();
        assert_eq!(next.get_position(), 1);
        assert_eq!(next.get_previous_hash(), genesis_hash);
        assert_eq!(next.get_size(), 1000);
        assert_eq!(next.get_transaction_count(), 2);
    }

    #[test]
    fn test_oversized_total_fails() {
        let result = assembler().assemble(vec![test_transfer(u64::MAX), test_transfer(1)], &Ledger::new());
        assert!(matches!(result, Err(LedgerError::InvalidBlock(_))));
    }

    #[test]
    fn test_empty_selection_fails() {
        let result = assembler().assemble(vec![], &Ledger::new());
        assert!(matches!(result, Err(LedgerError::EmptyInput)));
    }
}
