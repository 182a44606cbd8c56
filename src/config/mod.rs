//! Configuration management
//!
//! Chain settings come from built-in defaults, an optional TOML file and
//! `OX_*` environment variables, in that order of precedence.

pub mod settings;

pub use settings::{ChainConfig, DIFFICULTY_KEY, MAX_ATTEMPTS_KEY, MAX_BLOCK_SIZE_KEY};
