//! Build option and job matrix generation for cbci.
//!
//! This crate handles:
//! - The default build option table and its per-stage adjustments
//! - Decoding the user's JSON configuration blob
//! - Merging user values over defaults into `ALIAS=value` lines
//! - Normalizing requested Python versions, architectures and platforms
//! - Building the wheel build/validate job matrices

pub mod emit;
pub mod error;
pub mod matrix;
pub mod options;
pub mod selection;
pub mod user;

pub use emit::{BuildConfig, UnknownKeyPolicy};
pub use error::{ConfigError, ConfigResult};
pub use matrix::{ExclusionKey, MatrixFragment, StageMatrices, StageMatrixSet};
pub use options::{ConfigOption, OptionTable};
pub use selection::MatrixSelection;
pub use user::UserConfig;
