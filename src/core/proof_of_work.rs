use crate::core::{Block, BlockState};
use crate::error::{LedgerError, Result};
use crate::utils::hash;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Prefix used when nothing else is configured
pub const DEFAULT_DIFFICULTY: &str = "00";

/// Required literal prefix of a valid block hash, e.g. `"00"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Difficulty(String);

impl Difficulty {
    pub fn new(prefix: &str) -> Result<Difficulty> {
        if prefix.is_empty() {
            return Err(LedgerError::Config(
                "Difficulty prefix must not be empty".to_string(),
            ));
        }
        // hashes are rendered in lowercase hex, any other prefix can never match
        if !prefix
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(LedgerError::Config(format!(
                "Difficulty prefix {prefix:?} is not lowercase hex"
            )));
        }
        Ok(Difficulty(prefix.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_satisfied_by(&self, hash: &str) -> bool {
        hash.starts_with(&self.0)
    }

    /// Mean number of hashes needed to find a solution: 16^prefix length.
    pub fn expected_attempts(&self) -> f64 {
        16f64.powi(self.0.len() as i32)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty(DEFAULT_DIFFICULTY.to_string())
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Difficulty {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Difficulty> {
        Difficulty::new(&value)
    }
}

impl From<Difficulty> for String {
    fn from(difficulty: Difficulty) -> String {
        difficulty.0
    }
}

/// Brute-force nonce search over a block's canonical header serialization
pub struct ProofOfWork {
    difficulty: Difficulty,
    max_attempts: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
}

impl ProofOfWork {
    /// Unbounded search. Prefer [`ProofOfWork::with_max_attempts`] anywhere a
    /// caller needs to get control back.
    pub fn new(difficulty: Difficulty) -> ProofOfWork {
        ProofOfWork {
            difficulty,
            max_attempts: None,
            cancel: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> ProofOfWork {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// The search stops with `MiningCancelled` once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> ProofOfWork {
        self.cancel = Some(flag);
        self
    }

    pub fn get_difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    fn prepare_data(block: &Block, nonce: u64) -> Vec<u8> {
        block.header_bytes(nonce)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Search nonces from 0 upwards and return the first `(nonce, hash)`
    /// whose hash starts with the difficulty prefix.
    pub fn run(&self, block: &Block) -> Result<(u64, String)> {
        if block.get_header().get_difficulty() != self.difficulty.as_str() {
            return Err(LedgerError::InvalidBlock(format!(
                "Block was assembled for difficulty {:?}, miner targets {:?}",
                block.get_header().get_difficulty(),
                self.difficulty.as_str()
            )));
        }

        let limit = self.max_attempts.unwrap_or(u64::MAX);
        debug!(
            "Mining block at position {} (prefix {:?}, ~{:.0} expected attempts, limit {limit})",
            block.get_position(),
            self.difficulty.as_str(),
            self.difficulty.expected_attempts()
        );

        for nonce in 0..limit {
            if self.is_cancelled() {
                return Err(LedgerError::MiningCancelled { attempts: nonce });
            }
            let candidate = hash(&Self::prepare_data(block, nonce));
            if self.difficulty.is_satisfied_by(&candidate) {
                return Ok((nonce, candidate));
            }
        }

        Err(LedgerError::NoSolutionFound { attempts: limit })
    }

    /// Created -> Mined: runs the search and stamps the nonce and hash.
    pub fn mine(&self, mut block: Block) -> Result<Block> {
        if block.get_state() != BlockState::Created {
            return Err(LedgerError::InvalidBlock(format!(
                "Only created blocks can be mined; block at position {} is {}",
                block.get_position(),
                block.get_state()
            )));
        }

        let (nonce, hash) = self.run(&block)?;
        info!(
            "Proof-of-work completed for block {}: nonce {nonce}, hash {hash}",
            block.get_position()
        );
        block.seal(nonce, hash)?;
        Ok(block)
    }

    /// Recompute the header hash and check it is the stored one and that it
    /// satisfies the block's own difficulty.
    pub fn validate(block: &Block) -> bool {
        if block.get_state() == BlockState::Created {
            return false;
        }
        let difficulty = block.get_header().get_difficulty();
        let recomputed = hash(&Self::prepare_data(block, block.get_nonce()));
        recomputed == block.get_hash() && recomputed.starts_with(difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::create_test_block;

    #[test]
    fn test_difficulty_validation() {
        assert!(Difficulty::new("00").is_ok());
        assert!(Difficulty::new("0a").is_ok());
        assert!(Difficulty::new("").is_err());
        assert!(Difficulty::new("0A").is_err());
        assert!(Difficulty::new("zz").is_err());
    }

    #[test]
    fn test_expected_attempts() {
        assert_eq!(Difficulty::new("00").unwrap().expected_attempts(), 256.0);
    }

    #[test]
    fn test_mined_hash_has_prefix() {
        let pow = ProofOfWork::new(Difficulty::new("00").unwrap()).with_max_attempts(1_000_000);
        let block = pow.mine(create_test_block("00")).unwrap();

        assert_eq!(block.get_state(), BlockState::Mined);
        assert!(block.get_hash().starts_with("00"));
        assert!(ProofOfWork::validate(&block));
    }

    #[test]
    fn test_returns_first_solution_from_zero() {
        let pow = ProofOfWork::new(Difficulty::new("0").unwrap());
        let block = pow.mine(create_test_block("0")).unwrap();

        for nonce in 0..block.get_nonce() {
            assert!(!hash(&block.header_bytes(nonce)).starts_with('0'));
        }
        assert_eq!(hash(&block.header_bytes(block.get_nonce())), block.get_hash());
    }

    #[test]
    fn test_iteration_ceiling() {
        let pow = ProofOfWork::new(Difficulty::new("ffffffffffffffff").unwrap())
            .with_max_attempts(64);
        let result = pow.mine(create_test_block("ffffffffffffffff"));
        assert_eq!(
            result.unwrap_err(),
            LedgerError::NoSolutionFound { attempts: 64 }
        );
    }

    #[test]
    fn test_cancellation() {
        let flag = Arc::new(AtomicBool::new(true));
        let pow = ProofOfWork::new(Difficulty::new("ffffffffffffffff").unwrap())
            .with_cancellation(flag);
        let result = pow.mine(create_test_block("ffffffffffffffff"));
        assert_eq!(
            result.unwrap_err(),
            LedgerError::MiningCancelled { attempts: 0 }
        );
    }

    #[test]
    fn test_difficulty_mismatch_is_rejected() {
        let pow = ProofOfWork::new(Difficulty::new("00").unwrap());
        assert!(matches!(
            pow.mine(create_test_block("0")),
            Err(LedgerError::InvalidBlock(_))
        ));
    }

    #[test]
    fn test_cannot_mine_twice() {
        let pow = ProofOfWork::new(Difficulty::new("0").unwrap());
        let block = pow.mine(create_test_block("0")).unwrap();
        assert!(pow.mine(block).is_err());
    }

    #[test]
    fn test_validate_rejects_unmined_and_tampered_blocks() {
        assert!(!ProofOfWork::validate(&create_test_block("0")));

        let pow = ProofOfWork::new(Difficulty::new("0").unwrap());
        let mut block = pow.mine(create_test_block("0")).unwrap();
        assert!(ProofOfWork::validate(&block));

        // re-stamping a different nonce breaks the hash
        block.tamper_nonce(block.get_nonce() + 1);
        assert!(!ProofOfWork::validate(&block));
    }
}
