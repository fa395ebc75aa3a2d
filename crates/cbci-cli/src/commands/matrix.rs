//! Job matrix command.

use anyhow::Result;
use cbci_config::{ExclusionKey, MatrixSelection, StageMatrixSet, UserConfig};
use cbci_core::EnvSource;
use tracing::info;

pub fn get_stage_matrices(
    env: &impl EnvSource,
    config_key: &str,
    exclusion_key: ExclusionKey,
) -> Result<String> {
    let user = UserConfig::from_env(env, config_key)?;
    let selection = MatrixSelection::from_user_config(&user, env)?;
    info!(
        python_versions = ?selection.python_versions,
        x86_64_platforms = ?selection.x86_64_platforms,
        arm64_platforms = ?selection.arm64_platforms,
        "building stage matrices"
    );
    let matrices = StageMatrixSet::build(&selection, env, exclusion_key)?;
    Ok(serde_json::to_string(&matrices)?)
}
