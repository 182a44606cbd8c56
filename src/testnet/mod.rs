//! Shared fixtures for unit tests: easy difficulty, throwaway transfers and
//! seeded chains.

pub mod test_utils;

pub use test_utils::*;
