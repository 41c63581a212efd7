use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ScriptHostError, ScriptValue};

const DEFAULT_MAX_CALL_LEVELS: usize = 64;

/// Host-level executor settings, usually loaded from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorConfig {
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
    #[serde(default)]
    pub variables: BTreeMap<String, ScriptValue>,
    #[serde(default)]
    pub log_directory: Option<PathBuf>,
    #[serde(default)]
    pub strict_variables: bool,
    /// Operation budget per run; 0 means unlimited.
    #[serde(default)]
    pub max_operations: u64,
    #[serde(default = "default_max_call_levels")]
    pub max_call_levels: usize,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

fn default_max_call_levels() -> usize {
    DEFAULT_MAX_CALL_LEVELS
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            variables: BTreeMap::new(),
            log_directory: None,
            strict_variables: false,
            max_operations: 0,
            max_call_levels: DEFAULT_MAX_CALL_LEVELS,
            base_dir: None,
        }
    }
}

impl ExecutorConfig {
    pub fn load(path: &Path) -> Result<Self, ScriptHostError> {
        let raw = fs::read_to_string(path).map_err(|error| {
            ScriptHostError::new(
                "CONFIG_READ",
                format!("Failed to read config {}: {}", path.display(), error),
            )
        })?;
        let mut config: Self = serde_json::from_str(&raw).map_err(|error| {
            ScriptHostError::new(
                "CONFIG_INVALID",
                format!("Invalid config {}: {}", path.display(), error),
            )
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Search paths with relative entries anchored at the config file's
    /// directory, in declaration order.
    pub fn resolved_search_paths(&self) -> Vec<PathBuf> {
        self.search_paths
            .iter()
            .map(|path| self.resolve(path))
            .collect()
    }

    pub fn resolved_log_directory(&self) -> Option<PathBuf> {
        self.log_directory.as_deref().map(|path| self.resolve(path))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should move forward")
            .as_nanos();
        std::env::temp_dir().join(format!("sh-core-config-{}-{}", name, nanos))
    }

    #[test]
    fn deserialize_applies_defaults() {
        let config: ExecutorConfig = serde_json::from_str("{}").expect("config");
        assert_eq!(config, ExecutorConfig::default());
        assert_eq!(config.max_call_levels, DEFAULT_MAX_CALL_LEVELS);
    }

    #[test]
    fn load_resolves_relative_paths_against_config_dir() {
        let root = temp_dir("load");
        fs::create_dir_all(&root).expect("root");
        let path = root.join("executor.json");
        fs::write(
            &path,
            r#"{"searchPaths": ["lib", "/abs/lib"], "variables": {"team": "core"}, "logDirectory": "logs"}"#,
        )
        .expect("write config");

        let config = ExecutorConfig::load(&path).expect("load");
        assert_eq!(
            config.resolved_search_paths(),
            vec![root.join("lib"), PathBuf::from("/abs/lib")]
        );
        assert_eq!(config.resolved_log_directory(), Some(root.join("logs")));
        assert_eq!(config.variables.get("team"), Some(&ScriptValue::from("core")));
    }

    #[test]
    fn load_reports_missing_and_invalid_files() {
        let root = temp_dir("errors");
        fs::create_dir_all(&root).expect("root");

        let missing = ExecutorConfig::load(&root.join("missing.json")).expect_err("missing");
        assert_eq!(missing.code, "CONFIG_READ");

        let invalid_path = root.join("invalid.json");
        fs::write(&invalid_path, "{").expect("write");
        let invalid = ExecutorConfig::load(&invalid_path).expect_err("invalid");
        assert_eq!(invalid.code, "CONFIG_INVALID");
    }
}
