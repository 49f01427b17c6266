//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// The `encode` command: one selective-quality re-encode.
pub mod encode;
