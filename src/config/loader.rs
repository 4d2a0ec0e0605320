// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files.
//!
//! Handles loading configuration from JSON and YAML files in a workspace.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::MetricsFileConfig;

/// Config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &[".callmeter.json", ".callmeter.yaml", "callmeter.config.json"];

/// Local config file name (for per-machine overrides).
pub const LOCAL_CONFIG_FILE: &str = ".callmeter.local.json";

/// Load workspace configuration from the workspace root.
///
/// Searches for config files in the following order:
/// 1. .callmeter.json
/// 2. .callmeter.yaml
/// 3. callmeter.config.json
pub fn load_workspace_config(workspace_root: &Path) -> Result<Option<MetricsFileConfig>, ConfigError> {
    for filename in CONFIG_FILES {
        let path = workspace_root.join(filename);
        if path.exists() {
            return load_config_file(&path).map(Some);
        }
    }
    Ok(None)
}

/// Load local configuration from .callmeter.local.json.
pub fn load_local_config(workspace_root: &Path) -> Result<Option<MetricsFileConfig>, ConfigError> {
    let path = workspace_root.join(LOCAL_CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}

/// Load a configuration file (JSON or YAML).
pub fn load_config_file(path: &Path) -> Result<MetricsFileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let config: MetricsFileConfig = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };
    tracing::debug!(path = %path.display(), "Loaded instrumentation config");
    Ok(config)
}

/// Find the workspace root by searching for config files.
///
/// Walks up the directory tree from `start` until it finds a directory
/// containing a config file or reaches the filesystem root.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if CONFIG_FILES.iter().any(|f| current.join(f).exists()) {
            return Some(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_files_order() {
        assert_eq!(CONFIG_FILES.len(), 3);
        assert_eq!(CONFIG_FILES[0], ".callmeter.json");
    }

    #[test]
    fn test_load_workspace_config_not_found() {
        let temp = TempDir::new().unwrap();
        let result = load_workspace_config(temp.path());
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_load_workspace_config_json() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".callmeter.json"),
            r#"{"methodCallThreshold": 0.25, "namespace": "gitlab"}"#,
        )
        .unwrap();

        let config = load_workspace_config(temp.path()).unwrap().unwrap();
        assert_eq!(config.method_call_threshold, Some(0.25));
        assert_eq!(config.namespace, Some("gitlab".to_string()));
        assert!(config.histogram_buckets.is_none());
    }

    #[test]
    fn test_load_workspace_config_yaml() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".callmeter.yaml"),
            "method_call_threshold: 0.5\nhistogram_buckets: [0.05, 0.5, 5]\n",
        )
        .unwrap();

        let config = load_workspace_config(temp.path()).unwrap().unwrap();
        assert_eq!(config.method_call_threshold, Some(0.5));
        assert_eq!(config.histogram_buckets, Some(vec![0.05, 0.5, 5.0]));
    }

    #[test]
    fn test_json_preferred_over_yaml() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".callmeter.json"), r#"{"namespace": "json"}"#).unwrap();
        std::fs::write(temp.path().join(".callmeter.yaml"), "namespace: yaml\n").unwrap();

        let config = load_workspace_config(temp.path()).unwrap().unwrap();
        assert_eq!(config.namespace, Some("json".to_string()));
    }

    #[test]
    fn test_load_config_file_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".callmeter.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = load_config_file(&path);
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_load_config_file_missing() {
        let temp = TempDir::new().unwrap();
        let result = load_config_file(&temp.path().join("nope.json"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_local_config() {
        let temp = TempDir::new().unwrap();
        assert!(load_local_config(temp.path()).unwrap().is_none());

        std::fs::write(
            temp.path().join(LOCAL_CONFIG_FILE),
            r#"{"methodCallThreshold": 1.5}"#,
        )
        .unwrap();
        let config = load_local_config(temp.path()).unwrap().unwrap();
        assert_eq!(config.method_call_threshold, Some(1.5));
    }

    #[test]
    fn test_find_workspace_root() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("a").join("b").join("c");
        std::fs::create_dir_all(&subdir).unwrap();
        std::fs::write(temp.path().join(".callmeter.json"), "{}").unwrap();

        let found = find_workspace_root(&subdir);
        assert_eq!(found.unwrap(), temp.path());
    }

    #[test]
    fn test_find_workspace_root_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(find_workspace_root(temp.path()).is_none());
    }
}
