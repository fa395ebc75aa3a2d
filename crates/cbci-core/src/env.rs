//! Environment access.
//!
//! Every input besides the command line arrives through environment
//! variables set by the CI workflow. Lookups go through [`EnvSource`] so the
//! process environment can be swapped for a fixed map in tests.

use std::collections::HashMap;

use crate::{Error, Result};

// Project identity
pub const KEY_PROJECT_TYPE: &str = "CBCI_PROJECT_TYPE";

// Build hints, read quietly
pub const KEY_PREFER_CCACHE: &str = "PREFER_CCACHE";
pub const KEY_PREFER_VERBOSE_MAKEFILE: &str = "PREFER_VERBOSE_MAKEFILE";

// Whitelists (space separated)
pub const KEY_SUPPORTED_PYTHON_VERSIONS: &str = "CBCI_SUPPORTED_PYTHON_VERSIONS";
pub const KEY_SUPPORTED_X86_64_PLATFORMS: &str = "CBCI_SUPPORTED_X86_64_PLATFORMS";
pub const KEY_SUPPORTED_ARM64_PLATFORMS: &str = "CBCI_SUPPORTED_ARM64_PLATFORMS";

// Runner images and containers
pub const KEY_DEFAULT_LINUX_CONTAINER: &str = "CBCI_DEFAULT_LINUX_CONTAINER";
pub const KEY_DEFAULT_ALPINE_CONTAINER: &str = "CBCI_DEFAULT_ALPINE_CONTAINER";
pub const KEY_DEFAULT_LINUX_PLATFORM: &str = "CBCI_DEFAULT_LINUX_PLATFORM";
pub const KEY_DEFAULT_MACOS_X86_64_PLATFORM: &str = "CBCI_DEFAULT_MACOS_X86_64_PLATFORM";
pub const KEY_DEFAULT_MACOS_ARM64_PLATFORM: &str = "CBCI_DEFAULT_MACOS_ARM64_PLATFORM";
pub const KEY_DEFAULT_WINDOWS_PLATFORM: &str = "CBCI_DEFAULT_WINDOWS_PLATFORM";

/// A source of environment variables.
pub trait EnvSource {
    /// Raw lookup. `None` means the variable is not set at all.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Get a variable that must be set.
    fn require(&self, key: &str) -> Result<String> {
        self.lookup(key)
            .ok_or_else(|| Error::MissingEnv(key.to_string()))
    }

    /// Get a variable that may be absent. Empty values count as absent.
    fn optional(&self, key: &str) -> Option<String> {
        self.lookup(key).filter(|v| !v.is_empty())
    }

    /// Get a required, space-separated list.
    fn require_list(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .require(key)?
            .split_whitespace()
            .map(str::to_string)
            .collect())
    }
}

/// The environment of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}
