//! Normalization of the user's matrix selection.
//!
//! Requested Python versions, architectures and platforms are filtered
//! against whitelists. Unsupported values are dropped with a warning and an
//! empty result falls back to the whitelist, so a bad request never fails
//! the workflow.

use cbci_core::env::{EnvSource, KEY_SUPPORTED_PYTHON_VERSIONS};
use cbci_core::Arch;
use tracing::{debug, warn};

use crate::ConfigResult;
use crate::user::UserConfig;

const PYTHON_VERSION_KEYS: [&str; 2] = ["python_versions", "python-versions"];
const ARCHES_KEY: &str = "arches";
const PLATFORMS_KEY: &str = "platforms";

/// Normalized inputs for the matrix builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixSelection {
    pub python_versions: Vec<String>,
    pub arches: Vec<Arch>,
    pub x86_64_platforms: Vec<String>,
    pub arm64_platforms: Vec<String>,
}

impl MatrixSelection {
    /// Normalize the matrix keys of a user configuration.
    pub fn from_user_config(user: &UserConfig, env: &impl EnvSource) -> ConfigResult<Self> {
        let supported_versions = env.require_list(KEY_SUPPORTED_PYTHON_VERSIONS)?;
        let mut python_versions =
            normalize_python_versions(&user.list_text(&PYTHON_VERSION_KEYS), &supported_versions);
        if python_versions.is_empty() {
            python_versions = supported_versions;
        }

        let arches = normalize_arches(&user.list_text(&[ARCHES_KEY]));
        let requested_platforms = split_lowercase(&user.list_text(&[PLATFORMS_KEY]));

        let x86_64_platforms = if arches.contains(&Arch::X86_64) {
            platforms_for(Arch::X86_64, &requested_platforms, env)?
        } else {
            Vec::new()
        };
        let arm64_platforms = if arches.iter().any(Arch::is_arm) {
            platforms_for(Arch::Arm64, &requested_platforms, env)?
        } else {
            Vec::new()
        };

        let selection = Self {
            python_versions,
            arches,
            x86_64_platforms,
            arm64_platforms,
        };
        debug!(?selection, "normalized matrix selection");
        Ok(selection)
    }
}

/// Whether `version` is a supported Python version.
///
/// A bare `3` is always accepted. `X.Y` must be whitelisted verbatim and
/// `X.Y.Z` is checked by its `X.Y` prefix.
pub fn is_supported_python_version(version: &str, supported: &[String]) -> bool {
    let tokens: Vec<&str> = version.split('.').collect();
    match tokens.as_slice() {
        [major] => *major == "3",
        [_, _] => supported.iter().any(|s| s == version),
        [major, minor, _] => {
            let prefix = format!("{major}.{minor}");
            supported.iter().any(|s| *s == prefix)
        }
        _ => false,
    }
}

/// Keep the supported versions of a comma/space separated request, verbatim
/// and in order.
pub fn normalize_python_versions(raw: &str, supported: &[String]) -> Vec<String> {
    split_list(raw)
        .filter(|version| {
            let ok = is_supported_python_version(version, supported);
            if !ok {
                warn!("Unsupported Python version: {version}. Ignoring.");
            }
            ok
        })
        .map(str::to_string)
        .collect()
}

/// Parse a comma/space separated architecture request.
///
/// An empty result falls back to [`Arch::DEFAULTS`]. `aarch64` is dropped
/// when `arm64` is also present so the arm axis appears once.
pub fn normalize_arches(raw: &str) -> Vec<Arch> {
    let mut arches: Vec<Arch> = Vec::new();
    for token in split_list(raw) {
        match token.parse::<Arch>() {
            Ok(arch) if !arches.contains(&arch) => arches.push(arch),
            Ok(_) => {}
            Err(other) => warn!("Unsupported architecture: {other}. Ignoring."),
        }
    }

    if arches.is_empty() {
        arches = Arch::DEFAULTS.to_vec();
    }
    if arches.contains(&Arch::Arm64) {
        arches.retain(|a| *a != Arch::Aarch64);
    }
    arches
}

/// Filter the requested platforms against the whitelist for `arch`'s group,
/// falling back to the whole whitelist when nothing survives.
fn platforms_for(
    arch: Arch,
    requested: &[String],
    env: &impl EnvSource,
) -> ConfigResult<Vec<String>> {
    let supported = env.require_list(arch.platforms_key())?;
    let platforms = filter_platforms(arch, requested, &supported);
    if platforms.is_empty() {
        return Ok(supported);
    }
    Ok(platforms)
}

fn filter_platforms(arch: Arch, requested: &[String], supported: &[String]) -> Vec<String> {
    requested
        .iter()
        .filter(|platform| {
            let ok = supported.contains(platform);
            if !ok {
                warn!("Unsupported {arch} platform: {platform}. Ignoring.");
            }
            ok
        })
        .cloned()
        .collect()
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
}

fn split_lowercase(raw: &str) -> Vec<String> {
    split_list(raw).map(|s| s.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbci_core::MapEnv;
    use cbci_core::env::{KEY_SUPPORTED_ARM64_PLATFORMS, KEY_SUPPORTED_X86_64_PLATFORMS};

    fn supported() -> Vec<String> {
        ["3.9", "3.10", "3.11", "3.12", "3.13"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn whitelist_env() -> MapEnv {
        MapEnv::new()
            .with(KEY_SUPPORTED_PYTHON_VERSIONS, "3.10 3.11 3.12")
            .with(KEY_SUPPORTED_X86_64_PLATFORMS, "linux alpine macos windows")
            .with(KEY_SUPPORTED_ARM64_PLATFORMS, "linux macos")
    }

    fn select(config: &str) -> MatrixSelection {
        let user = UserConfig::parse(config).unwrap();
        MatrixSelection::from_user_config(&user, &whitelist_env()).unwrap()
    }

    #[test]
    fn test_is_supported_python_version() {
        let supported = supported();
        assert!(is_supported_python_version("3", &supported));
        assert!(!is_supported_python_version("2", &supported));
        assert!(is_supported_python_version("3.12", &supported));
        assert!(is_supported_python_version("3.12.1", &supported));
        assert!(!is_supported_python_version("3.8.10", &supported));
        assert!(!is_supported_python_version("4.0", &supported));
        assert!(!is_supported_python_version("3.12.1.2", &supported));
    }

    #[test]
    fn test_normalize_python_versions_keeps_order_and_spelling() {
        let versions = normalize_python_versions("3.13, 3.8 3.12.1,3", &supported());
        assert_eq!(versions, vec!["3.13", "3.12.1", "3"]);
    }

    #[test]
    fn test_normalize_arches() {
        assert_eq!(normalize_arches(""), vec![Arch::X86_64, Arch::Arm64]);
        assert_eq!(normalize_arches("ppc64le"), vec![Arch::X86_64, Arch::Arm64]);
        assert_eq!(normalize_arches("ARM64, x86_64"), vec![Arch::Arm64, Arch::X86_64]);
        assert_eq!(normalize_arches("aarch64"), vec![Arch::Aarch64]);
    }

    #[test]
    fn test_arm64_and_aarch64_deduplicated() {
        let arches = normalize_arches("arm64,aarch64");
        assert!(arches.contains(&Arch::Arm64));
        assert!(!arches.contains(&Arch::Aarch64));

        let arches = normalize_arches("aarch64 arm64");
        assert_eq!(arches, vec![Arch::Arm64]);
    }

    #[test]
    fn test_selection_defaults() {
        let selection = select("{}");
        assert_eq!(selection.python_versions, vec!["3.10", "3.11", "3.12"]);
        assert_eq!(selection.arches, vec![Arch::X86_64, Arch::Arm64]);
        assert_eq!(
            selection.x86_64_platforms,
            vec!["linux", "alpine", "macos", "windows"]
        );
        assert_eq!(selection.arm64_platforms, vec!["linux", "macos"]);
    }

    #[test]
    fn test_selection_filters_per_arch() {
        let selection = select(r#"{"platforms": "Linux, alpine", "python-versions": "3.11"}"#);
        assert_eq!(selection.python_versions, vec!["3.11"]);
        assert_eq!(selection.x86_64_platforms, vec!["linux", "alpine"]);
        // alpine is not an arm64 platform
        assert_eq!(selection.arm64_platforms, vec!["linux"]);
    }

    #[test]
    fn test_selection_falls_back_per_arch() {
        let selection = select(r#"{"platforms": "alpine"}"#);
        assert_eq!(selection.x86_64_platforms, vec!["alpine"]);
        assert_eq!(selection.arm64_platforms, vec!["linux", "macos"]);
    }

    #[test]
    fn test_selection_skips_unrequested_arch() {
        let selection = select(r#"{"arches": "x86_64", "platforms": ["windows"]}"#);
        assert_eq!(selection.arches, vec![Arch::X86_64]);
        assert_eq!(selection.x86_64_platforms, vec!["windows"]);
        assert!(selection.arm64_platforms.is_empty());

        let selection = select(r#"{"arches": "aarch64"}"#);
        assert!(selection.x86_64_platforms.is_empty());
        assert_eq!(selection.arm64_platforms, vec!["linux", "macos"]);
    }

    #[test]
    fn test_selection_unsupported_versions_fall_back() {
        let selection = select(r#"{"python_versions": "2.7, 4.0"}"#);
        assert_eq!(selection.python_versions, vec!["3.10", "3.11", "3.12"]);
    }

    #[test]
    fn test_selection_requires_whitelists() {
        let user = UserConfig::default();
        let env = MapEnv::new().with(KEY_SUPPORTED_PYTHON_VERSIONS, "3.12");
        let err = MatrixSelection::from_user_config(&user, &env).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Environment variable CBCI_SUPPORTED_X86_64_PLATFORMS not set."
        );
    }
}
