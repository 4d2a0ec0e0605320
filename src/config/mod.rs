// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for callmeter.
//!
//! Handles loading, merging, and validation of instrumentation settings from
//! multiple sources:
//! - Workspace config: .callmeter.json, .callmeter.yaml, or callmeter.config.json
//! - Local config: .callmeter.local.json (for per-machine overrides)
//! - Environment: CALLMETER_METHOD_CALL_THRESHOLD, CALLMETER_NAMESPACE
//!
//! Configuration is merged with precedence (env > local > workspace > defaults).

mod loader;
mod merger;
mod types;

pub use loader::{
    find_workspace_root, load_config_file, load_local_config, load_workspace_config,
    CONFIG_FILES, LOCAL_CONFIG_FILE,
};
pub use merger::{merge_config, EnvOverrides, ENV_NAMESPACE, ENV_THRESHOLD};
pub use types::{InstrumentationConfig, MetricsFileConfig, DEFAULT_METHOD_CALL_THRESHOLD};

use crate::error::ConfigError;
use std::path::Path;

/// Load, merge and validate all configuration sources for a workspace.
pub fn load_config(workspace_root: &Path) -> Result<InstrumentationConfig, ConfigError> {
    load_config_with(workspace_root, EnvOverrides::from_env())
}

/// Like [`load_config`], with explicit environment overrides.
pub fn load_config_with(
    workspace_root: &Path,
    env: EnvOverrides,
) -> Result<InstrumentationConfig, ConfigError> {
    let workspace = load_workspace_config(workspace_root)?;
    let local = load_local_config(workspace_root)?;

    let config = merge_config(workspace, local, env);
    config.validate()?;
    Ok(config)
}
