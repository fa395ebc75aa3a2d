//! CLI command implementations.
//!
//! Each command returns the single line the CLI prints on success.

pub mod config;
pub mod matrix;
pub mod wheel;
