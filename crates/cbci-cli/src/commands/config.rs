//! Build option commands.

use anyhow::Result;
use cbci_config::UnknownKeyPolicy;
use cbci_config::emit::parse_config;
use cbci_core::{ConfigStage, EnvSource};

pub fn parse_sdist_config(
    env: &impl EnvSource,
    project_key: &str,
    config_key: &str,
    policy: UnknownKeyPolicy,
) -> Result<String> {
    let config = parse_config(env, ConfigStage::BuildSdist, project_key, config_key, policy)?;
    Ok(config.to_string())
}

pub fn parse_wheel_config(
    env: &impl EnvSource,
    project_key: &str,
    config_key: &str,
    policy: UnknownKeyPolicy,
) -> Result<String> {
    let config = parse_config(env, ConfigStage::BuildWheel, project_key, config_key, policy)?;
    Ok(config.to_string())
}
