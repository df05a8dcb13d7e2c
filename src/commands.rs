//! Subcommand implementations for the `clx` binary.
pub mod generate;
