//! Error handling for the ledger
//!
//! Every fallible operation in the crate returns [`LedgerError`]. None of the
//! variants is fatal: the miner loop is expected to retry on its next tick.

use std::fmt;
use uuid::Uuid;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error taxonomy for the block-assembly and validation pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Merkle construction was given zero fingerprints
    EmptyInput,
    /// Proof-of-work exceeded its iteration ceiling
    NoSolutionFound { attempts: u64 },
    /// Proof-of-work was stopped through its cancellation flag
    MiningCancelled { attempts: u64 },
    /// A block's position does not match the ledger length
    PositionConflict { expected: usize, found: usize },
    /// The ledger has no blocks yet
    EmptyChain,
    /// A single transaction is larger than the whole block capacity
    OversizedTransaction { id: Uuid, size: u64, capacity: u64 },
    /// Block validation errors
    InvalidBlock(String),
    /// Transaction validation errors
    InvalidTransaction(String),
    /// Failures reported by the persistence collaborator
    Repository(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
    /// Serialization/deserialization errors
    Serialization(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::EmptyInput => {
                write!(f, "Cannot build a Merkle root from an empty fingerprint list")
            }
            LedgerError::NoSolutionFound { attempts } => {
                write!(f, "No proof-of-work solution found after {attempts} attempts")
            }
            LedgerError::MiningCancelled { attempts } => {
                write!(f, "Mining cancelled after {attempts} attempts")
            }
            LedgerError::PositionConflict { expected, found } => write!(
                f,
                "Position conflict: ledger expects position {expected}, block has {found}"
            ),
            LedgerError::EmptyChain => write!(f, "The ledger contains no blocks"),
            LedgerError::OversizedTransaction { id, size, capacity } => write!(
                f,
                "Transaction {id} of size {size} exceeds block capacity {capacity}"
            ),
            LedgerError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            LedgerError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            LedgerError::Repository(msg) => write!(f, "Repository error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl LedgerError {
    /// Whether the miner loop may simply try again on its next tick.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::NoSolutionFound { .. }
                | LedgerError::MiningCancelled { .. }
                | LedgerError::PositionConflict { .. }
                | LedgerError::EmptyInput
        )
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for LedgerError {
    fn from(err: toml::ser::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}
