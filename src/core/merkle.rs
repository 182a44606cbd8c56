use crate::core::Transaction;
use crate::error::{LedgerError, Result};
use crate::utils::hash_pair;
use serde::{Deserialize, Serialize};

/// A Merkle leaf: the transaction's position in the selection plus the hash
/// of its canonical serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub index: usize,
    pub hash: String,
}

impl Fingerprint {
    /// Fingerprints in selection order. Order matters: the tree is not sorted.
    pub fn from_transactions(transactions: &[Transaction]) -> Vec<Fingerprint> {
        transactions
            .iter()
            .enumerate()
            .map(|(index, tx)| Fingerprint {
                index,
                hash: tx.fingerprint(),
            })
            .collect()
    }
}

/// Ordered, pairwise Merkle tree over transaction fingerprints
///
/// Every level is kept, leaves first, so proofs can be produced for any leaf.
/// A level with an odd count pairs its last element with itself, which also
/// makes the root of a single leaf `hash_pair(leaf, leaf)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleTree {
    levels: Vec<Vec<String>>,
}

/// Merkle proof for transaction verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Fingerprint being proven
    pub transaction_hash: String,
    /// Merkle root hash
    pub merkle_root: String,
    /// Sibling hashes from the leaf level upwards
    pub proof_path: Vec<ProofElement>,
    /// Index of the transaction in the block
    pub transaction_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofElement {
    /// Sibling hash
    pub hash: String,
    /// Direction: true if sibling is on the right, false if on the left
    pub is_right: bool,
}

impl MerkleTree {
    /// Create a new Merkle tree from a list of transactions
    pub fn new(transactions: &[Transaction]) -> Result<Self> {
        Self::from_fingerprints(&Fingerprint::from_transactions(transactions))
    }

    pub fn from_fingerprints(fingerprints: &[Fingerprint]) -> Result<Self> {
        if fingerprints.is_empty() {
            return Err(LedgerError::EmptyInput);
        }

        let mut ordered: Vec<&Fingerprint> = fingerprints.iter().collect();
        ordered.sort_by_key(|fp| fp.index);
        let leaves: Vec<String> = ordered.into_iter().map(|fp| fp.hash.clone()).collect();

        let mut levels = vec![leaves];
        loop {
            let current = &levels[levels.len() - 1];
            let next = Self::next_level(current);
            let done = next.len() == 1;
            levels.push(next);
            if done {
                break;
            }
        }

        Ok(MerkleTree { levels })
    }

    fn next_level(current: &[String]) -> Vec<String> {
        current
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => hash_pair(left, right),
                [only] => hash_pair(only, only),
                _ => unreachable!("chunks(2) yields one or two elements"),
            })
            .collect()
    }

    pub fn get_root_hash(&self) -> &str {
        self.levels
            .last()
            .and_then(|level| level.first())
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map(Vec::len).unwrap_or(0)
    }

    /// Generate a Merkle proof for a transaction at the given index
    pub fn generate_proof(&self, transaction_index: usize) -> Result<MerkleProof> {
        let leaf_count = self.leaf_count();
        if transaction_index >= leaf_count {
            return Err(LedgerError::InvalidBlock(format!(
                "Transaction index {transaction_index} out of bounds (leaves: {leaf_count})"
            )));
        }

        let mut proof_path = Vec::with_capacity(self.levels.len() - 1);
        let mut index = transaction_index;
        for level in &self.levels[..self.levels.len() - 1] {
            let is_right = index % 2 == 0;
            let sibling_index = if is_right { index + 1 } else { index - 1 };
            // odd tail: the node is paired with itself
            let sibling = level.get(sibling_index).unwrap_or(&level[index]);
            proof_path.push(ProofElement {
                hash: sibling.clone(),
                is_right,
            });
            index /= 2;
        }

        Ok(MerkleProof {
            transaction_hash: self.levels[0][transaction_index].clone(),
            merkle_root: self.get_root_hash().to_string(),
            proof_path,
            transaction_index,
        })
    }

    /// Verify a Merkle proof
    pub fn verify_proof(proof: &MerkleProof) -> bool {
        let mut current_hash = proof.transaction_hash.clone();

        for element in &proof.proof_path {
            current_hash = if element.is_right {
                hash_pair(&current_hash, &element.hash)
            } else {
                hash_pair(&element.hash, &current_hash)
            };
        }

        current_hash == proof.merkle_root
    }

    /// Root of the ordered fingerprint list without keeping the tree around.
    pub fn calculate_merkle_root(fingerprints: &[Fingerprint]) -> Result<String> {
        Ok(Self::from_fingerprints(fingerprints)?
            .get_root_hash()
            .to_string())
    }

    /// Verify that a list of transactions produces the expected Merkle root
    pub fn verify_transactions(transactions: &[Transaction], expected_root: &str) -> Result<bool> {
        let root = Self::calculate_merkle_root(&Fingerprint::from_transactions(transactions))?;
        Ok(root == expected_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hash;

    fn fingerprints(labels: &[&str]) -> Vec<Fingerprint> {
        labels
            .iter()
            .enumerate()
            .map(|(index, label)| Fingerprint {
                index,
                hash: hash(label.as_bytes()),
            })
            .collect()
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(
            MerkleTree::calculate_merkle_root(&[]),
            Err(LedgerError::EmptyInput)
        );
    }

    #[test]
    fn test_single_fingerprint_root() {
        let fps = fingerprints(&["genesis"]);
        let root = MerkleTree::calculate_merkle_root(&fps).unwrap();
        assert_eq!(root, hash_pair(&fps[0].hash, &fps[0].hash));
    }

    #[test]
    fn test_two_fingerprint_root() {
        let fps = fingerprints(&["a", "b"]);
        let root = MerkleTree::calculate_merkle_root(&fps).unwrap();
        assert_eq!(root, hash_pair(&fps[0].hash, &fps[1].hash));
    }

    #[test]
    fn test_odd_count_duplicates_last() {
        let fps = fingerprints(&["a", "b", "c"]);
        let root = MerkleTree::calculate_merkle_root(&fps).unwrap();

        let ab = hash_pair(&fps[0].hash, &fps[1].hash);
        let cc = hash_pair(&fps[2].hash, &fps[2].hash);
        assert_eq!(root, hash_pair(&ab, &cc));
    }

    #[test]
    fn test_root_is_deterministic() {
        let fps = fingerprints(&["a", "b", "c", "d", "e"]);
        let first = MerkleTree::calculate_merkle_root(&fps).unwrap();
        for _ in 0..5 {
            assert_eq!(MerkleTree::calculate_merkle_root(&fps).unwrap(), first);
        }
    }

    #[test]
    fn test_root_is_order_sensitive() {
        let forward = fingerprints(&["a", "b", "c", "d"]);
        let swapped = fingerprints(&["b", "a", "c", "d"]);
        assert_ne!(
            MerkleTree::calculate_merkle_root(&forward).unwrap(),
            MerkleTree::calculate_merkle_root(&swapped).unwrap()
        );
    }

    #[test]
    fn test_index_field_defines_order() {
        let mut fps = fingerprints(&["a", "b", "c"]);
        let expected = MerkleTree::calculate_merkle_root(&fps).unwrap();
        fps.reverse();
        assert_eq!(MerkleTree::calculate_merkle_root(&fps).unwrap(), expected);
    }

    #[test]
    fn test_proofs_verify_for_every_leaf() {
        for count in 1..=7 {
            let labels: Vec<String> = (0..count).map(|i| format!("tx-{i}")).collect();
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            let tree = MerkleTree::from_fingerprints(&fingerprints(&refs)).unwrap();

            for index in 0..count {
                let proof = tree.generate_proof(index).unwrap();
                assert_eq!(proof.merkle_root, tree.get_root_hash());
                assert!(MerkleTree::verify_proof(&proof), "leaf {index} of {count}");
            }
        }
    }

    #[test]
    fn test_tampered_proof_fails() {
        let tree = MerkleTree::from_fingerprints(&fingerprints(&["a", "b", "c", "d"])).unwrap();
        let mut proof = tree.generate_proof(2).unwrap();
        proof.transaction_hash = hash(b"forged");
        assert!(!MerkleTree::verify_proof(&proof));
    }

    #[test]
    fn test_proof_index_out_of_bounds() {
        let tree = MerkleTree::from_fingerprints(&fingerprints(&["a", "b"])).unwrap();
        assert!(tree.generate_proof(2).is_err());
    }
}
