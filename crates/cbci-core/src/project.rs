//! SDK project and configuration stage identity.

use derive_more::Display;
use std::str::FromStr;

use crate::env::{EnvSource, KEY_PROJECT_TYPE};
use crate::{Error, Result};

/// The SDK being built. The display form is the short code substituted into
/// option alias templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SdkProject {
    #[display("PYCBCC")]
    Columnar,
    #[display("PYCBC")]
    Operational,
}

impl SdkProject {
    /// Short code used as the alias prefix (e.g. `PYCBC_USE_OPENSSL`).
    pub fn short_code(&self) -> &'static str {
        match self {
            SdkProject::Columnar => "PYCBCC",
            SdkProject::Operational => "PYCBC",
        }
    }

    /// Resolve the project from an environment variable.
    pub fn from_env(env: &impl EnvSource, key: &str) -> Result<Self> {
        env.require(key)?.parse()
    }

    /// Resolve the project from the default `CBCI_PROJECT_TYPE` variable.
    pub fn from_default_env(env: &impl EnvSource) -> Result<Self> {
        Self::from_env(env, KEY_PROJECT_TYPE)
    }
}

impl FromStr for SdkProject {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "COLUMNAR" | "PYCBCC" => Ok(SdkProject::Columnar),
            "OPERATIONAL" | "PYCBC" => Ok(SdkProject::Operational),
            _ => Err(Error::InvalidProject(s.to_string())),
        }
    }
}

/// Which build phase configuration is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ConfigStage {
    #[display("build_sdist")]
    BuildSdist,
    #[display("build_wheel")]
    BuildWheel,
    #[display("validate_wheel")]
    ValidateWheel,
}

impl ConfigStage {
    /// Stages that fan out into job matrices, in output order.
    pub const MATRIX_STAGES: [ConfigStage; 2] =
        [ConfigStage::BuildWheel, ConfigStage::ValidateWheel];

    /// Key under which this stage's matrices are emitted.
    /// The sdist stage never builds a matrix.
    pub fn matrix_key(&self) -> Option<&'static str> {
        match self {
            ConfigStage::BuildSdist => None,
            ConfigStage::BuildWheel => Some("build_wheels"),
            ConfigStage::ValidateWheel => Some("validate_wheels"),
        }
    }
}
