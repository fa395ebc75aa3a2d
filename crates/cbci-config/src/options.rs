//! Default build option table and per-stage adjustment.

use cbci_core::env::{EnvSource, KEY_PREFER_CCACHE, KEY_PREFER_VERBOSE_MAKEFILE};
use cbci_core::{ConfigStage, SdkProject};
use indexmap::IndexMap;

/// Placeholder replaced by the project short code in alias templates.
const ALIAS_PLACEHOLDER: &str = "SDKPROJECT";

/// Extra option introduced when a ccache directory is preferred.
pub const CCACHE_DIR: &str = "CCACHE_DIR";

/// (name, default, description, alias template)
const DEFAULT_OPTIONS: &[(&str, Option<&str>, &str, &str)] = &[
    (
        "USE_OPENSSL",
        Some("OFF"),
        "Use OpenSSL instead of boringssl",
        "SDKPROJECT_USE_OPENSSL",
    ),
    (
        "OPENSSL_VERSION",
        None,
        "The version of OpenSSL to use instead of boringssl",
        "SDKPROJECT_OPENSSL_VERSION",
    ),
    (
        "SET_CPM_CACHE",
        Some("ON"),
        "Initialize the C++ core CPM cache",
        "SDKPROJECT_SET_CPM_CACHE",
    ),
    (
        "USE_LIMITED_API",
        None,
        "Set to enable use of Py_LIMITED_API",
        "SDKPROJECT_LIMITED_API",
    ),
    (
        "VERBOSE_MAKEFILE",
        None,
        "Use verbose logging when configuring/building",
        "SDKPROJECT_VERBOSE_MAKEFILE",
    ),
    (
        "BUILD_TYPE",
        Some("RelWithDebInfo"),
        "Sets the build type when configuring/building",
        "SDKPROJECT_BUILD_TYPE",
    ),
    (
        "CB_CACHE_OPTION",
        None,
        "Sets the builds ccache option",
        "SDKPROJECT_CB_CACHE_OPTION",
    ),
];

/// A single build option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOption {
    pub name: String,
    /// `None` means the option has no default and is never filled in.
    pub default: Option<String>,
    pub description: String,
    pub required: bool,
    /// Alias template until [`OptionTable::resolve_aliases`] runs, then the
    /// emitted variable name.
    pub alias: String,
}

impl ConfigOption {
    fn new(name: &str, default: Option<&str>, description: &str, alias: &str) -> Self {
        Self {
            name: name.to_string(),
            default: default.map(str::to_string),
            description: description.to_string(),
            required: false,
            alias: alias.to_string(),
        }
    }

    fn require_with_default(&mut self, default: impl Into<String>) {
        self.required = true;
        self.default = Some(default.into());
    }
}

/// Ordered table of build options, keyed by option name.
#[derive(Debug, Clone)]
pub struct OptionTable {
    options: IndexMap<String, ConfigOption>,
}

impl OptionTable {
    /// The unadjusted table with unresolved alias templates.
    pub fn defaults() -> Self {
        let options = DEFAULT_OPTIONS
            .iter()
            .map(|(name, default, description, alias)| {
                (
                    name.to_string(),
                    ConfigOption::new(name, *default, description, alias),
                )
            })
            .collect();
        Self { options }
    }

    /// Build the table for a stage and project, applying environment hints.
    pub fn for_stage(stage: ConfigStage, project: SdkProject, env: &impl EnvSource) -> Self {
        let mut table = Self::defaults();
        table.apply_stage(stage, env);
        table.resolve_aliases(project);
        table
    }

    fn apply_stage(&mut self, stage: ConfigStage, env: &impl EnvSource) {
        match stage {
            ConfigStage::BuildSdist => {
                self.mark_required("SET_CPM_CACHE");
            }
            ConfigStage::BuildWheel => {
                self.mark_required("BUILD_TYPE");
                if let Some(ccache_dir) = env.optional(KEY_PREFER_CCACHE) {
                    if let Some(option) = self.options.get_mut("CB_CACHE_OPTION") {
                        option.require_with_default("ccache");
                    }
                    let mut dir = ConfigOption::new(
                        CCACHE_DIR,
                        None,
                        "Directory used by ccache",
                        CCACHE_DIR,
                    );
                    dir.require_with_default(ccache_dir);
                    self.options.insert(CCACHE_DIR.to_string(), dir);
                }
                if env.optional(KEY_PREFER_VERBOSE_MAKEFILE).is_some() {
                    if let Some(option) = self.options.get_mut("VERBOSE_MAKEFILE") {
                        option.require_with_default("ON");
                    }
                }
            }
            ConfigStage::ValidateWheel => {}
        }
    }

    fn mark_required(&mut self, name: &str) {
        if let Some(option) = self.options.get_mut(name) {
            option.required = true;
        }
    }

    /// Substitute the project short code into every alias template.
    pub fn resolve_aliases(&mut self, project: SdkProject) {
        for option in self.options.values_mut() {
            option.alias = option
                .alias
                .replace(ALIAS_PLACEHOLDER, project.short_code());
        }
    }

    pub fn get(&self, name: &str) -> Option<&ConfigOption> {
        self.options.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    /// Options in table order.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigOption> {
        self.options.values()
    }

    /// Required options that carry a default, in table order.
    pub fn required_defaults(&self) -> impl Iterator<Item = (&ConfigOption, &str)> {
        self.options
            .values()
            .filter(|o| o.required)
            .filter_map(|o| o.default.as_deref().map(|d| (o, d)))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
