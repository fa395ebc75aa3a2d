//! Architecture and OS family vocabulary.

use derive_more::Display;
use std::str::FromStr;

use crate::env::{KEY_SUPPORTED_ARM64_PLATFORMS, KEY_SUPPORTED_X86_64_PLATFORMS};

/// A CPU architecture a user may request.
///
/// `Arm64` and `Aarch64` name the same hardware; they are kept apart because
/// runners and image tags disagree on the spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Arch {
    #[display("x86_64")]
    X86_64,
    #[display("arm64")]
    Arm64,
    #[display("aarch64")]
    Aarch64,
}

impl Arch {
    /// Every accepted spelling, in preference order.
    pub const ALL: [Arch; 3] = [Arch::X86_64, Arch::Arm64, Arch::Aarch64];

    /// Architectures used when the user requests none.
    pub const DEFAULTS: [Arch; 2] = [Arch::X86_64, Arch::Arm64];

    pub fn is_arm(&self) -> bool {
        matches!(self, Arch::Arm64 | Arch::Aarch64)
    }

    /// Environment variable holding the platform whitelist for this
    /// architecture's group.
    pub fn platforms_key(&self) -> &'static str {
        if self.is_arm() {
            KEY_SUPPORTED_ARM64_PLATFORMS
        } else {
            KEY_SUPPORTED_X86_64_PLATFORMS
        }
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "x86_64" => Ok(Arch::X86_64),
            "arm64" => Ok(Arch::Arm64),
            "aarch64" => Ok(Arch::Aarch64),
            other => Err(other.to_string()),
        }
    }
}

/// An operating-system family with its own matrix fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum OsFamily {
    #[display("linux")]
    Linux,
    #[display("macos")]
    Macos,
    #[display("windows")]
    Windows,
}

impl OsFamily {
    pub const ALL: [OsFamily; 3] = [OsFamily::Linux, OsFamily::Macos, OsFamily::Windows];

    /// Name of the presence flag emitted next to the fragment.
    pub fn presence_key(&self) -> &'static str {
        match self {
            OsFamily::Linux => "has_linux",
            OsFamily::Macos => "has_macos",
            OsFamily::Windows => "has_windows",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arch_case_folded() {
        assert_eq!(" X86_64 ".parse::<Arch>(), Ok(Arch::X86_64));
        assert_eq!("ARM64".parse::<Arch>(), Ok(Arch::Arm64));
        assert_eq!("aarch64".parse::<Arch>(), Ok(Arch::Aarch64));
        assert_eq!("ppc64le".parse::<Arch>(), Err("ppc64le".to_string()));
    }

    #[test]
    fn test_arm_spellings_share_whitelist() {
        assert_eq!(
            Arch::Arm64.platforms_key(),
            Arch::Aarch64.platforms_key()
        );
        assert_ne!(Arch::X86_64.platforms_key(), Arch::Arm64.platforms_key());
    }

    #[test]
    fn test_family_keys() {
        let keys: Vec<String> = OsFamily::ALL.iter().map(|f| f.to_string()).collect();
        assert_eq!(keys, vec!["linux", "macos", "windows"]);
        assert_eq!(OsFamily::Macos.presence_key(), "has_macos");
    }
}
