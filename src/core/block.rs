use crate::core::{Fingerprint, MerkleProof, MerkleTree, Transaction};
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use data_encoding::HEXLOWER;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Previous-hash value carried by the genesis block: one rendered digest of zeros
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Tag written first in every canonical header serialization
pub const HEADER_FORMAT_VERSION: &str = "hdr-v1";

/// Block lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockState {
    /// Fields populated, no nonce or hash yet
    Created,
    /// Nonce and hash assigned by proof-of-work
    Mined,
    /// Stored in the ledger; terminal
    Appended,
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockState::Created => write!(f, "created"),
            BlockState::Mined => write!(f, "mined"),
            BlockState::Appended => write!(f, "appended"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    version: String,
    previous_hash: String,
    merkle_root: String,
    timestamp: DateTime<Utc>,
    difficulty: String, // required hex prefix of `hash`
    nonce: u64,
    hash: String,
}

impl BlockHeader {
    pub fn new(
        version: &str,
        previous_hash: &str,
        merkle_root: &str,
        timestamp: DateTime<Utc>,
        difficulty: &str,
    ) -> BlockHeader {
        BlockHeader {
            version: version.to_string(),
            previous_hash: previous_hash.to_string(),
            merkle_root: merkle_root.to_string(),
            timestamp,
            difficulty: difficulty.to_string(),
            nonce: 0,
            hash: String::new(),
        }
    }

    pub fn get_version(&self) -> &str {
        &self.version
    }

    pub fn get_previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn get_merkle_root(&self) -> &str {
        &self.merkle_root
    }

    pub fn get_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn get_difficulty(&self) -> &str {
        &self.difficulty
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_hash(&self) -> &str {
        &self.hash
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    position: usize,
    header: BlockHeader,
    transactions: Vec<Transaction>,
    size: u64,
    transaction_count: usize,
    magic: String, // random salt mixed into the proof-of-work input
    state: BlockState,
}

impl Block {
    /// Build an unmined block. Fails with `EmptyInput` when there are no
    /// transactions to commit to, and with `InvalidBlock` when their sizes
    /// add up past `u64::MAX`.
    pub fn new_block(
        position: usize,
        previous_hash: &str,
        transactions: Vec<Transaction>,
        timestamp: DateTime<Utc>,
        version: &str,
        difficulty: &str,
    ) -> Result<Block> {
        let merkle_root = Self::calculate_merkle_root(&transactions)?;
        let size = Self::total_size(&transactions).ok_or_else(|| {
            LedgerError::InvalidBlock(format!(
                "Transaction sizes at position {position} overflow a block size"
            ))
        })?;

        Ok(Block {
            position,
            header: BlockHeader::new(version, previous_hash, &merkle_root, timestamp, difficulty),
            transaction_count: transactions.len(),
            transactions,
            size,
            magic: Self::new_magic(),
            state: BlockState::Created,
        })
    }

    fn total_size(transactions: &[Transaction]) -> Option<u64> {
        transactions
            .iter()
            .try_fold(0u64, |total, tx| total.checked_add(tx.get_size()))
    }

    fn new_magic() -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        HEXLOWER.encode(&bytes)
    }

    pub fn get_position(&self) -> usize {
        self.position
    }

    pub fn get_header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_size(&self) -> u64 {
        self.size
    }

    pub fn get_transaction_count(&self) -> usize {
        self.transaction_count
    }

    pub fn get_magic(&self) -> &str {
        &self.magic
    }

    pub fn get_state(&self) -> BlockState {
        self.state
    }

    pub fn get_hash(&self) -> &str {
        self.header.get_hash()
    }

    pub fn get_previous_hash(&self) -> &str {
        self.header.get_previous_hash()
    }

    pub fn get_merkle_root(&self) -> &str {
        self.header.get_merkle_root()
    }

    pub fn get_nonce(&self) -> u64 {
        self.header.get_nonce()
    }

    pub fn is_genesis(&self) -> bool {
        self.position == 0
    }

    /// Hands the transactions back, e.g. to return them to the pool after a
    /// failed mining attempt.
    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }

    /// Created -> Mined. Only the proof-of-work search calls this.
    pub(crate) fn seal(&mut self, nonce: u64, hash: String) -> Result<()> {
        if self.state != BlockState::Created {
            return Err(LedgerError::InvalidBlock(format!(
                "Block at position {} is already {}",
                self.position, self.state
            )));
        }
        self.header.nonce = nonce;
        self.header.hash = hash;
        self.state = BlockState::Mined;
        Ok(())
    }

    /// Mined -> Appended. Only the ledger calls this.
    pub(crate) fn mark_appended(&mut self) {
        self.state = BlockState::Appended;
    }

    #[cfg(test)]
    pub(crate) fn tamper_nonce(&mut self, nonce: u64) {
        self.header.nonce = nonce;
    }

    /// Canonical proof-of-work input for a given nonce.
    ///
    /// Field order: format tag, version, previous hash, Merkle root,
    /// timestamp millis, difficulty, position, magic, nonce; `|`-delimited.
    pub fn header_bytes(&self, nonce: u64) -> Vec<u8> {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}",
            HEADER_FORMAT_VERSION,
            self.header.version,
            self.header.previous_hash,
            self.header.merkle_root,
            self.header.timestamp.timestamp_millis(),
            self.header.difficulty,
            self.position,
            self.magic,
            nonce
        )
        .into_bytes()
    }

    /// Calculate the Merkle root over the fingerprints of `transactions`
    pub fn calculate_merkle_root(transactions: &[Transaction]) -> Result<String> {
        MerkleTree::calculate_merkle_root(&Fingerprint::from_transactions(transactions))
    }

    /// Verify that the block's Merkle root matches its transactions
    pub fn verify_merkle_root(&self) -> Result<bool> {
        MerkleTree::verify_transactions(&self.transactions, self.get_merkle_root())
    }

    /// Generate a Merkle proof for a transaction in this block
    pub fn generate_merkle_proof(&self, transaction_index: usize) -> Result<MerkleProof> {
        MerkleTree::new(&self.transactions)?.generate_proof(transaction_index)
    }

    /// Verify a Merkle proof against this block's Merkle root
    pub fn verify_merkle_proof(&self, proof: &MerkleProof) -> bool {
        proof.merkle_root == self.get_merkle_root() && MerkleTree::verify_proof(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Amount;
    use crate::utils::{current_timestamp, hash_pair};
    use crate::wallet::WalletId;

    fn transfer(size: u64) -> Transaction {
        Transaction::new_transfer(WalletId::new(), WalletId::new(), Amount::from_coins(1), None, size)
            .unwrap()
    }

    #[test]
    fn test_new_block_aggregates_transactions() {
        let txs = vec![transfer(100), transfer(250), transfer(7)];
        let block =
            Block::new_block(3, "prev", txs, current_timestamp(), "0.1", "00").unwrap();

        assert_eq!(block.get_position(), 3);
        assert_eq!(block.get_size(), 357);
        assert_eq!(block.get_transaction_count(), 3);
        assert_eq!(block.get_state(), BlockState::Created);
        assert!(block.get_hash().is_empty());
        assert_eq!(block.get_magic().len(), 32);
        assert!(block.verify_merkle_root().unwrap());
    }

    #[test]
    fn test_size_overflow_is_rejected() {
        let txs = vec![transfer(u64::MAX), transfer(1)];
        let result = Block::new_block(0, "prev", txs, current_timestamp(), "0.1", "00");
        assert!(matches!(result, Err(LedgerError::InvalidBlock(_))));

        let block = Block::new_block(0, "prev", vec![transfer(u64::MAX)], current_timestamp(), "0.1", "00")
            .unwrap();
        assert_eq!(block.get_size(), u64::MAX);
    }

    #[test]
    fn test_empty_block_is_rejected() {
        let result = Block::new_block(0, GENESIS_PREVIOUS_HASH, vec![], current_timestamp(), "0.1", "00");
        assert!(matches!(result, Err(LedgerError::EmptyInput)));
    }

    #[test]
    fn test_single_transaction_merkle_root() {
        let tx = transfer(1);
        let fp = tx.fingerprint();
        let block =
            Block::new_block(0, GENESIS_PREVIOUS_HASH, vec![tx], current_timestamp(), "0.1", "00")
                .unwrap();
        assert_eq!(block.get_merkle_root(), hash_pair(&fp, &fp));
    }

    #[test]
    fn test_magic_differs_between_blocks() {
        let a = Block::new_block(0, "p", vec![transfer(1)], current_timestamp(), "0.1", "0").unwrap();
        let b = Block::new_block(0, "p", vec![transfer(1)], current_timestamp(), "0.1", "0").unwrap();
        assert_ne!(a.get_magic(), b.get_magic());
    }

    #[test]
    fn test_seal_only_once() {
        let mut block =
            Block::new_block(0, "p", vec![transfer(1)], current_timestamp(), "0.1", "0").unwrap();
        block.seal(7, "0abc".to_string()).unwrap();
        assert_eq!(block.get_state(), BlockState::Mined);
        assert_eq!(block.get_nonce(), 7);
        assert!(block.seal(8, "0def".to_string()).is_err());
    }

    #[test]
    fn test_header_bytes_vary_with_nonce() {
        let block = Block::new_block(0, "p", vec![transfer(1)], current_timestamp(), "0.1", "0").unwrap();
        assert_eq!(block.header_bytes(1), block.header_bytes(1));
        assert_ne!(block.header_bytes(1), block.header_bytes(2));
    }

    #[test]
    fn test_block_merkle_proofs() {
        let block = Block::new_block(
            0,
            "p",
            vec![transfer(1), transfer(2), transfer(3)],
            current_timestamp(),
            "0.1",
            "0",
        )
        .unwrap();
        let proof = block.generate_merkle_proof(1).unwrap();
        assert_eq!(proof.transaction_hash, block.get_transactions()[1].fingerprint());
        assert!(block.verify_merkle_proof(&proof));
    }
}
