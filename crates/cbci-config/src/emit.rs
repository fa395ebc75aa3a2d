//! Merging user values over the option table and rendering the result.

use std::fmt;
use std::str::FromStr;

use cbci_core::{ConfigStage, EnvSource, SdkProject};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::options::OptionTable;
use crate::user::{STAGE_MATRIX_KEYS, UserConfig};
use crate::{ConfigError, ConfigResult};

/// What to do with user keys that are not build options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeyPolicy {
    #[default]
    Ignore,
    Reject,
}

impl FromStr for UnknownKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" | "lenient" => Ok(UnknownKeyPolicy::Ignore),
            "reject" | "strict" => Ok(UnknownKeyPolicy::Reject),
            other => Err(format!("unknown key policy: {other}")),
        }
    }
}

/// One emitted option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub alias: String,
    pub value: String,
}

/// The merged configuration, keyed by option name in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
    entries: IndexMap<String, ConfigEntry>,
}

impl BuildConfig {
    /// Merge `user` over `table`.
    pub fn merge(
        table: &OptionTable,
        user: &UserConfig,
        policy: UnknownKeyPolicy,
    ) -> ConfigResult<Self> {
        let mut entries = IndexMap::new();

        for (key, value) in user.iter() {
            if STAGE_MATRIX_KEYS.contains(&key) {
                continue;
            }
            let Some(option) = table.get(key) else {
                match policy {
                    UnknownKeyPolicy::Ignore => {
                        debug!(key, "ignoring unknown option");
                        continue;
                    }
                    UnknownKeyPolicy::Reject => {
                        return Err(ConfigError::UnknownOption(key.to_string()));
                    }
                }
            };
            entries.insert(
                key.to_string(),
                ConfigEntry {
                    alias: option.alias.clone(),
                    value: render_value(value),
                },
            );
        }

        for (option, default) in table.required_defaults() {
            if entries.contains_key(&option.name) {
                continue;
            }
            debug!(
                option = %option.name,
                description = %option.description,
                default,
                "applying required default"
            );
            entries.insert(
                option.name.clone(),
                ConfigEntry {
                    alias: option.alias.clone(),
                    value: default.to_string(),
                },
            );
        }

        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&ConfigEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `ALIAS=value` tokens joined by single spaces.
impl fmt::Display for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.values().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", entry.alias, entry.value)?;
        }
        Ok(())
    }
}

/// Booleans become ON/OFF, strings are verbatim, anything else is compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::Bool(true) => "ON".to_string(),
        Value::Bool(false) => "OFF".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolve the project, build the stage's option table and merge the user
/// configuration stored in `config_key`.
pub fn parse_config(
    env: &impl EnvSource,
    stage: ConfigStage,
    project_key: &str,
    config_key: &str,
    policy: UnknownKeyPolicy,
) -> ConfigResult<BuildConfig> {
    let project = SdkProject::from_env(env, project_key)?;
    let table = OptionTable::for_stage(stage, project, env);
    let user = UserConfig::from_env(env, config_key)?;
    debug!(%stage, %project, options = table.len(), "merging build config");
    BuildConfig::merge(&table, &user, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbci_core::MapEnv;
    use cbci_core::env::{KEY_PREFER_CCACHE, KEY_PREFER_VERBOSE_MAKEFILE, KEY_PROJECT_TYPE};

    const CONFIG_KEY: &str = "CBCI_CONFIG";

    fn env_with_config(config: &str) -> MapEnv {
        MapEnv::new()
            .with(KEY_PROJECT_TYPE, "operational")
            .with(CONFIG_KEY, config)
    }

    fn render(env: &MapEnv, stage: ConfigStage) -> String {
        parse_config(env, stage, KEY_PROJECT_TYPE, CONFIG_KEY, UnknownKeyPolicy::Ignore)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_sdist_empty_config() {
        let env = MapEnv::new().with(KEY_PROJECT_TYPE, "PYCBC");
        assert_eq!(render(&env, ConfigStage::BuildSdist), "PYCBC_SET_CPM_CACHE=ON");
    }

    #[test]
    fn test_wheel_empty_config() {
        let env = MapEnv::new().with(KEY_PROJECT_TYPE, "columnar");
        assert_eq!(
            render(&env, ConfigStage::BuildWheel),
            "PYCBCC_BUILD_TYPE=RelWithDebInfo"
        );
    }

    #[test]
    fn test_validate_stage_has_no_required_options() {
        let env = MapEnv::new().with(KEY_PROJECT_TYPE, "columnar");
        assert_eq!(render(&env, ConfigStage::ValidateWheel), "");
    }

    #[test]
    fn test_booleans_coerce_to_on_off() {
        let env = env_with_config(r#"{"USE_OPENSSL": true, "SET_CPM_CACHE": false}"#);
        assert_eq!(
            render(&env, ConfigStage::BuildSdist),
            "PYCBC_USE_OPENSSL=ON PYCBC_SET_CPM_CACHE=OFF"
        );
    }

    #[test]
    fn test_other_values_pass_through() {
        let env = env_with_config(
            r#"{"OPENSSL_VERSION": "3.4.0", "USE_LIMITED_API": 312, "BUILD_TYPE": "Debug"}"#,
        );
        assert_eq!(
            render(&env, ConfigStage::BuildWheel),
            "PYCBC_OPENSSL_VERSION=3.4.0 PYCBC_LIMITED_API=312 PYCBC_BUILD_TYPE=Debug"
        );
    }

    #[test]
    fn test_unknown_and_matrix_keys_are_skipped() {
        let env = env_with_config(
            r#"{"python_versions": "3.12", "platforms": "linux", "NOT_AN_OPTION": "x", "arches": "x86_64"}"#,
        );
        let line = render(&env, ConfigStage::BuildSdist);
        assert_eq!(line, "PYCBC_SET_CPM_CACHE=ON");
        assert!(!line.contains("NOT_AN_OPTION"));
    }

    #[test]
    fn test_strict_policy_rejects_unknown_keys() {
        let env = env_with_config(r#"{"python_versions": "3.12", "NOT_AN_OPTION": "x"}"#);
        let err = parse_config(
            &env,
            ConfigStage::BuildSdist,
            KEY_PROJECT_TYPE,
            CONFIG_KEY,
            UnknownKeyPolicy::Reject,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOption(ref k) if k == "NOT_AN_OPTION"));
        assert_eq!(err.to_string(), "Invalid key: NOT_AN_OPTION");
    }

    #[test]
    fn test_user_value_wins_over_required_default() {
        let env = env_with_config(r#"{"SET_CPM_CACHE": "OFF"}"#);
        assert_eq!(render(&env, ConfigStage::BuildSdist), "PYCBC_SET_CPM_CACHE=OFF");
    }

    #[test]
    fn test_wheel_with_hints() {
        let env = env_with_config(r#"{"USE_OPENSSL": false}"#)
            .with(KEY_PREFER_CCACHE, "/ccache")
            .with(KEY_PREFER_VERBOSE_MAKEFILE, "yes");
        assert_eq!(
            render(&env, ConfigStage::BuildWheel),
            "PYCBC_USE_OPENSSL=OFF PYCBC_VERBOSE_MAKEFILE=ON PYCBC_BUILD_TYPE=RelWithDebInfo \
             PYCBC_CB_CACHE_OPTION=ccache CCACHE_DIR=/ccache"
        );
    }

    #[test]
    fn test_missing_project_is_fatal() {
        let env = MapEnv::new();
        let err = parse_config(
            &env,
            ConfigStage::BuildSdist,
            KEY_PROJECT_TYPE,
            CONFIG_KEY,
            UnknownKeyPolicy::Ignore,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Environment variable CBCI_PROJECT_TYPE not set.");
    }

    #[test]
    fn test_invalid_project_is_fatal() {
        let env = MapEnv::new().with(KEY_PROJECT_TYPE, "mobile");
        let err = parse_config(
            &env,
            ConfigStage::BuildWheel,
            KEY_PROJECT_TYPE,
            CONFIG_KEY,
            UnknownKeyPolicy::Ignore,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid SDK project: mobile");
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "strict".parse::<UnknownKeyPolicy>(),
            Ok(UnknownKeyPolicy::Reject)
        );
        assert_eq!(
            "ignore".parse::<UnknownKeyPolicy>(),
            Ok(UnknownKeyPolicy::Ignore)
        );
        assert!("maybe".parse::<UnknownKeyPolicy>().is_err());
    }
}
