// facepreserve-cli/src/lib.rs
//
// Library portion of the FacePreserve CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod progress;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, DetectorKind, EncodeArgs};
pub use commands::encode::run_encode;
