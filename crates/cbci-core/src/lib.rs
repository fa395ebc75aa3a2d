//! Core domain types for the cbci build-configuration helper.
//!
//! This crate contains:
//! - Environment access (process-backed and map-backed sources)
//! - SDK project and configuration stage identity
//! - Architecture and OS family vocabulary
//! - Wheel filename parsing

pub mod env;
pub mod error;
pub mod platform;
pub mod project;
pub mod wheel;

pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use error::{Error, Result};
pub use platform::{Arch, OsFamily};
pub use project::{ConfigStage, SdkProject};
pub use wheel::WheelName;
