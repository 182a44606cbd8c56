use crate::core::{
    Amount, Difficulty, DEFAULT_GENESIS_TRANSFER, DEFAULT_MINER_REWARD, DEFAULT_SUPPLY_LIMIT,
};
use crate::error::{LedgerError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const DIFFICULTY_KEY: &str = "OX_DIFFICULTY";
pub const MAX_BLOCK_SIZE_KEY: &str = "OX_MAX_BLOCK_SIZE";
pub const MAX_ATTEMPTS_KEY: &str = "OX_MAX_ATTEMPTS";

const DEFAULT_VERSION: &str = "0.1";

/// Chain settings. Every field is optional in a TOML file; missing ones keep
/// their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Version tag written into every block header
    pub version: String,
    /// Required hex prefix of every block hash
    pub difficulty: Difficulty,
    /// Capacity of a block, in transaction bytes
    pub max_block_size: u64,
    /// Transactions older than this many months are selected first
    pub aged_after_months: u32,
    pub miner_reward: Amount,
    /// The reward halves once per this many appended blocks
    pub halving_interval: usize,
    pub supply_limit: Amount,
    /// Paid from the genesis wallet to every user wallet at start-up
    pub genesis_transfer: Amount,
    /// Proof-of-work iteration ceiling per block
    pub max_attempts: u64,
    /// Re-assembly attempts after a position conflict
    pub append_retries: u32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            version: DEFAULT_VERSION.to_string(),
            difficulty: Difficulty::default(),
            max_block_size: 1_000_000,
            aged_after_months: 3,
            miner_reward: DEFAULT_MINER_REWARD,
            halving_interval: 10,
            supply_limit: DEFAULT_SUPPLY_LIMIT,
            genesis_transfer: DEFAULT_GENESIS_TRANSFER,
            max_attempts: 50_000_000,
            append_retries: 3,
        }
    }
}

impl ChainConfig {
    /// Defaults, then the optional TOML file, then environment variables.
    pub fn load(path: Option<&Path>) -> Result<ChainConfig> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => ChainConfig::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<ChainConfig> {
        debug!("Loading chain configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|err| LedgerError::Config(format!("unable to parse {}: {err}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `OX_*` overrides from `lookup`; the process environment in
    /// [`ChainConfig::load`].
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup(DIFFICULTY_KEY) {
            self.difficulty = Difficulty::new(&prefix)?;
        }
        if let Some(size) = lookup(MAX_BLOCK_SIZE_KEY) {
            self.max_block_size = Self::parse_number(MAX_BLOCK_SIZE_KEY, &size)?;
        }
        if let Some(attempts) = lookup(MAX_ATTEMPTS_KEY) {
            self.max_attempts = Self::parse_number(MAX_ATTEMPTS_KEY, &attempts)?;
        }
        Ok(())
    }

    fn parse_number(key: &str, value: &str) -> Result<u64> {
        value
            .trim()
            .parse()
            .map_err(|_| LedgerError::Config(format!("{key} must be a positive integer, got {value:?}")))
    }

    pub fn validate(&self) -> Result<()> {
        Difficulty::new(self.difficulty.as_str())?;
        if self.max_block_size == 0 {
            return Err(LedgerError::Config(
                "max_block_size must be greater than zero".to_string(),
            ));
        }
        if self.halving_interval == 0 {
            return Err(LedgerError::Config(
                "halving_interval must be greater than zero".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(LedgerError::Config(
                "max_attempts must be greater than zero".to_string(),
            ));
        }
        if !self.supply_limit.is_positive() {
            return Err(LedgerError::Config(format!(
                "supply_limit must be positive, got {}",
                self.supply_limit
            )));
        }
        if self.miner_reward.is_negative() || self.genesis_transfer.is_negative() {
            return Err(LedgerError::Config(
                "miner_reward and genesis_transfer must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
