//! Job matrix generation for the wheel build and validate stages.
//!
//! Each OS family has a small rule table per stage. A rule fires when its
//! platform was selected for its architecture group and adds its axis values
//! to the family's fragment. Values that name runner images or containers
//! are read from the environment only when a rule that needs them fires or
//! the fragment is non-empty and stamps them as fixed axes.

use std::str::FromStr;

use cbci_core::env::{
    KEY_DEFAULT_ALPINE_CONTAINER, KEY_DEFAULT_LINUX_CONTAINER, KEY_DEFAULT_LINUX_PLATFORM,
    KEY_DEFAULT_MACOS_ARM64_PLATFORM, KEY_DEFAULT_MACOS_X86_64_PLATFORM,
    KEY_DEFAULT_WINDOWS_PLATFORM,
};
use cbci_core::{Arch, ConfigStage, EnvSource, OsFamily};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::debug;

use crate::selection::MatrixSelection;
use crate::ConfigResult;

/// A matrix axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Axis {
    #[serde(rename = "linux-type")]
    LinuxType,
    #[serde(rename = "container")]
    Container,
    #[serde(rename = "os")]
    Os,
    #[serde(rename = "arch")]
    Arch,
}

/// Where an axis value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisValue {
    Literal(&'static str),
    Env(&'static str),
}

impl AxisValue {
    fn resolve(&self, env: &impl EnvSource) -> ConfigResult<String> {
        match self {
            AxisValue::Literal(value) => Ok(value.to_string()),
            AxisValue::Env(key) => Ok(env.require(key)?),
        }
    }

    /// Like `resolve`, but an unset variable yields `None`. An unset value
    /// cannot be on any axis, since placing it there required resolving it.
    fn lookup(&self, env: &impl EnvSource) -> Option<String> {
        match self {
            AxisValue::Literal(value) => Some(value.to_string()),
            AxisValue::Env(key) => env.lookup(key),
        }
    }
}

use AxisValue::{Env, Literal};

/// Adds `values` when `platform` is selected for `arch`'s group.
struct Rule {
    arch: Arch,
    platform: &'static str,
    values: &'static [(Axis, AxisValue)],
}

/// The rules for one family at one stage.
struct FamilyRules {
    rules: &'static [Rule],
    /// Stamped onto a fragment once any rule fired.
    fixed: &'static [(Axis, AxisValue)],
    /// Each candidate is emitted when all of its values are in the fragment.
    exclusions: &'static [&'static [(Axis, AxisValue)]],
}

static LINUX_BUILD: FamilyRules = FamilyRules {
    rules: &[
        Rule {
            arch: Arch::X86_64,
            platform: "linux",
            values: &[
                (Axis::LinuxType, Literal("manylinux")),
                (Axis::Arch, Literal("x86_64")),
            ],
        },
        Rule {
            arch: Arch::Arm64,
            platform: "linux",
            values: &[
                (Axis::LinuxType, Literal("manylinux")),
                (Axis::Arch, Literal("aarch64")),
            ],
        },
        Rule {
            arch: Arch::X86_64,
            platform: "alpine",
            values: &[
                (Axis::LinuxType, Literal("musllinux")),
                (Axis::Arch, Literal("x86_64")),
            ],
        },
    ],
    fixed: &[],
    // musl wheels are not built for aarch64
    exclusions: &[&[
        (Axis::LinuxType, Literal("musllinux")),
        (Axis::Arch, Literal("aarch64")),
    ]],
};

static LINUX_VALIDATE: FamilyRules = FamilyRules {
    rules: &[
        Rule {
            arch: Arch::X86_64,
            platform: "linux",
            values: &[
                (Axis::Container, Env(KEY_DEFAULT_LINUX_CONTAINER)),
                (Axis::Arch, Literal("x86_64")),
            ],
        },
        Rule {
            arch: Arch::Arm64,
            platform: "linux",
            values: &[
                (Axis::Container, Env(KEY_DEFAULT_LINUX_CONTAINER)),
                (Axis::Arch, Literal("aarch64")),
            ],
        },
        Rule {
            arch: Arch::X86_64,
            platform: "alpine",
            values: &[
                (Axis::Container, Env(KEY_DEFAULT_ALPINE_CONTAINER)),
                (Axis::Arch, Literal("x86_64")),
            ],
        },
    ],
    fixed: &[(Axis::Os, Env(KEY_DEFAULT_LINUX_PLATFORM))],
    exclusions: &[&[
        (Axis::Container, Env(KEY_DEFAULT_ALPINE_CONTAINER)),
        (Axis::Arch, Literal("aarch64")),
    ]],
};

static MACOS_BUILD: FamilyRules = FamilyRules {
    rules: &[
        Rule {
            arch: Arch::X86_64,
            platform: "macos",
            values: &[
                (Axis::Os, Env(KEY_DEFAULT_MACOS_X86_64_PLATFORM)),
                (Axis::Arch, Literal("x86_64")),
            ],
        },
        Rule {
            arch: Arch::Arm64,
            platform: "macos",
            values: &[
                (Axis::Os, Env(KEY_DEFAULT_MACOS_ARM64_PLATFORM)),
                (Axis::Arch, Literal("arm64")),
            ],
        },
    ],
    fixed: &[],
    // each runner image only runs its own architecture
    exclusions: &[
        &[
            (Axis::Os, Env(KEY_DEFAULT_MACOS_X86_64_PLATFORM)),
            (Axis::Arch, Literal("arm64")),
        ],
        &[
            (Axis::Os, Env(KEY_DEFAULT_MACOS_ARM64_PLATFORM)),
            (Axis::Arch, Literal("x86_64")),
        ],
    ],
};

static MACOS_VALIDATE: FamilyRules = FamilyRules {
    rules: &[
        Rule {
            arch: Arch::X86_64,
            platform: "macos",
            values: &[(Axis::Os, Env(KEY_DEFAULT_MACOS_X86_64_PLATFORM))],
        },
        Rule {
            arch: Arch::Arm64,
            platform: "macos",
            values: &[(Axis::Os, Env(KEY_DEFAULT_MACOS_ARM64_PLATFORM))],
        },
    ],
    fixed: &[],
    exclusions: &[],
};

// arm64 Windows is not supported
static WINDOWS: FamilyRules = FamilyRules {
    rules: &[Rule {
        arch: Arch::X86_64,
        platform: "windows",
        values: &[
            (Axis::Os, Env(KEY_DEFAULT_WINDOWS_PLATFORM)),
            (Axis::Arch, Literal("AMD64")),
        ],
    }],
    fixed: &[],
    exclusions: &[],
};

fn family_rules(family: OsFamily, stage: ConfigStage) -> Option<&'static FamilyRules> {
    match (family, stage) {
        (OsFamily::Linux, ConfigStage::BuildWheel) => Some(&LINUX_BUILD),
        (OsFamily::Linux, ConfigStage::ValidateWheel) => Some(&LINUX_VALIDATE),
        (OsFamily::Macos, ConfigStage::BuildWheel) => Some(&MACOS_BUILD),
        (OsFamily::Macos, ConfigStage::ValidateWheel) => Some(&MACOS_VALIDATE),
        (OsFamily::Windows, ConfigStage::BuildWheel | ConfigStage::ValidateWheel) => {
            Some(&WINDOWS)
        }
        (_, ConfigStage::BuildSdist) => None,
    }
}

/// Spelling of the key holding a fragment's exclusion list.
///
/// Downstream workflows were written against the misspelled `exlude`, so
/// that stays the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExclusionKey {
    #[default]
    Legacy,
    Standard,
}

impl ExclusionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionKey::Legacy => "exlude",
            ExclusionKey::Standard => "exclude",
        }
    }
}

impl FromStr for ExclusionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exlude" | "legacy" => Ok(ExclusionKey::Legacy),
            "exclude" | "standard" => Ok(ExclusionKey::Standard),
            other => Err(format!("unknown exclusion key: {other}")),
        }
    }
}

/// The matrix for one OS family at one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixFragment {
    /// Axis values in first-added order.
    pub axes: IndexMap<Axis, Vec<String>>,
    pub python_versions: Vec<String>,
    pub exclusions: Vec<Vec<(Axis, String)>>,
    pub exclusion_key: ExclusionKey,
}

impl MatrixFragment {
    /// Build the fragment for `family` at `stage`. Returns `None` when no
    /// selected platform maps onto the family.
    pub fn build(
        family: OsFamily,
        stage: ConfigStage,
        selection: &MatrixSelection,
        env: &impl EnvSource,
        exclusion_key: ExclusionKey,
    ) -> ConfigResult<Option<Self>> {
        let Some(rules) = family_rules(family, stage) else {
            return Ok(None);
        };

        let mut axes: IndexMap<Axis, Vec<String>> = IndexMap::new();
        for rule in rules.rules {
            let platforms = if rule.arch.is_arm() {
                &selection.arm64_platforms
            } else {
                &selection.x86_64_platforms
            };
            if !platforms.iter().any(|p| p == rule.platform) {
                continue;
            }
            for (axis, value) in rule.values {
                ensure(&mut axes, *axis, value.resolve(env)?);
            }
        }
        if axes.is_empty() {
            return Ok(None);
        }

        for (axis, value) in rules.fixed {
            axes.insert(*axis, vec![value.resolve(env)?]);
        }

        let exclusions: Vec<Vec<(Axis, String)>> = rules
            .exclusions
            .iter()
            .filter_map(|candidate| {
                candidate
                    .iter()
                    .map(|(axis, value)| value.lookup(env).map(|v| (*axis, v)))
                    .collect::<Option<Vec<_>>>()
            })
            .filter(|pairs| {
                pairs.iter().all(|(axis, value)| {
                    axes.get(axis)
                        .is_some_and(|values| values.contains(value))
                })
            })
            .collect();

        debug!(
            %family,
            %stage,
            axes = axes.len(),
            exclusions = exclusions.len(),
            "built matrix fragment"
        );
        Ok(Some(Self {
            axes,
            python_versions: selection.python_versions.clone(),
            exclusions,
            exclusion_key,
        }))
    }

    pub fn axis(&self, axis: Axis) -> &[String] {
        self.axes.get(&axis).map(Vec::as_slice).unwrap_or_default()
    }
}

fn ensure(axes: &mut IndexMap<Axis, Vec<String>>, axis: Axis, value: String) {
    let values = axes.entry(axis).or_default();
    if !values.contains(&value) {
        values.push(value);
    }
}

struct ExclusionPair<'a>(&'a [(Axis, String)]);

impl Serialize for ExclusionPair<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (axis, value) in self.0 {
            map.serialize_entry(axis, value)?;
        }
        map.end()
    }
}

impl Serialize for MatrixFragment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (axis, values) in &self.axes {
            map.serialize_entry(axis, values)?;
        }
        map.serialize_entry("python-version", &self.python_versions)?;
        if !self.exclusions.is_empty() {
            let pairs: Vec<ExclusionPair<'_>> = self
                .exclusions
                .iter()
                .map(|pair| ExclusionPair(pair.as_slice()))
                .collect();
            map.serialize_entry(self.exclusion_key.as_str(), &pairs)?;
        }
        map.end()
    }
}

/// All family fragments for one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageMatrices {
    fragments: IndexMap<OsFamily, MatrixFragment>,
}

impl StageMatrices {
    pub fn build(
        stage: ConfigStage,
        selection: &MatrixSelection,
        env: &impl EnvSource,
        exclusion_key: ExclusionKey,
    ) -> ConfigResult<Self> {
        let mut fragments = IndexMap::new();
        for family in OsFamily::ALL {
            if let Some(fragment) =
                MatrixFragment::build(family, stage, selection, env, exclusion_key)?
            {
                fragments.insert(family, fragment);
            }
        }
        Ok(Self { fragments })
    }

    pub fn get(&self, family: OsFamily) -> Option<&MatrixFragment> {
        self.fragments.get(&family)
    }

    pub fn has(&self, family: OsFamily) -> bool {
        self.fragments.contains_key(&family)
    }
}

/// Emits each present fragment under its family name followed by its
/// `has_<family>` flag.
impl Serialize for StageMatrices {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for family in OsFamily::ALL {
            if let Some(fragment) = self.fragments.get(&family) {
                map.serialize_entry(&family.to_string(), fragment)?;
            }
            map.serialize_entry(family.presence_key(), &self.has(family))?;
        }
        map.end()
    }
}

/// Matrices for every matrix stage, keyed by stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageMatrixSet {
    stages: Vec<(ConfigStage, StageMatrices)>,
}

impl StageMatrixSet {
    pub fn build(
        selection: &MatrixSelection,
        env: &impl EnvSource,
        exclusion_key: ExclusionKey,
    ) -> ConfigResult<Self> {
        let mut stages = Vec::with_capacity(ConfigStage::MATRIX_STAGES.len());
        for stage in ConfigStage::MATRIX_STAGES {
            stages.push((
                stage,
                StageMatrices::build(stage, selection, env, exclusion_key)?,
            ));
        }
        Ok(Self { stages })
    }

    pub fn stage(&self, stage: ConfigStage) -> Option<&StageMatrices> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, matrices)| matrices)
    }
}

impl Serialize for StageMatrixSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.stages.len()))?;
        for (stage, matrices) in &self.stages {
            if let Some(key) = stage.matrix_key() {
                map.serialize_entry(key, matrices)?;
            }
        }
        map.end()
    }
}
