//! Command-line interface
//!
//! This module contains the argument definitions for the demo binary.

pub mod commands;

pub use commands::{Command, Opt};
