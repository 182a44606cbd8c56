//! Utility functions and helpers
//!
//! This module contains the hashing primitive shared by the Merkle tree and
//! the proof-of-work search, plus small time helpers.

pub mod crypto;

pub use crypto::{
    current_timestamp, hash, hash_pair, months_before, sha256_digest, DIGEST_HEX_LEN,
};
