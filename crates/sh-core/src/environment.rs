use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::ScriptValue;

pub const ENV_HOST_VERSION: &str = "SCRIPTHOST_HOST_VERSION";
pub const ENV_ENGINE_VERSION: &str = "SCRIPTHOST_ENGINE_VERSION";
pub const ENV_CLONE_NAME: &str = "SCRIPTHOST_CLONE";
pub const ENV_SESSION_ID: &str = "SCRIPTHOST_SESSION";

const DEFAULT_CLONE_NAME: &str = "default";

/// Host/session facts frozen at runtime construction, so a script observes
/// the environment as it was before the script itself ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    pub runtime_version: String,
    pub engine_version: String,
    pub host_version: String,
    pub session_id: String,
    pub clone_name: String,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl EnvironmentSnapshot {
    /// Reads the snapshot from the process environment.
    pub fn capture() -> Self {
        Self::capture_from(|key| std::env::var(key).ok())
    }

    pub fn capture_from(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            runtime_version: env!("CARGO_PKG_VERSION").to_string(),
            engine_version: lookup(ENV_ENGINE_VERSION).unwrap_or_default(),
            host_version: lookup(ENV_HOST_VERSION).unwrap_or_default(),
            session_id: lookup(ENV_SESSION_ID).unwrap_or_else(|| process_session_id().to_string()),
            clone_name: lookup(ENV_CLONE_NAME).unwrap_or_else(|| DEFAULT_CLONE_NAME.to_string()),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_engine_version(mut self, engine_version: impl Into<String>) -> Self {
        if self.engine_version.is_empty() {
            self.engine_version = engine_version.into();
        }
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn to_value(&self) -> ScriptValue {
        let mut map = BTreeMap::from([
            (
                "runtime_version".to_string(),
                ScriptValue::from(self.runtime_version.clone()),
            ),
            (
                "engine_version".to_string(),
                ScriptValue::from(self.engine_version.clone()),
            ),
            (
                "host_version".to_string(),
                ScriptValue::from(self.host_version.clone()),
            ),
            (
                "session_id".to_string(),
                ScriptValue::from(self.session_id.clone()),
            ),
            (
                "clone_name".to_string(),
                ScriptValue::from(self.clone_name.clone()),
            ),
        ]);
        for (key, value) in &self.extra {
            map.entry(key.clone())
                .or_insert_with(|| ScriptValue::from(value.clone()));
        }
        ScriptValue::Map(map)
    }
}

fn process_session_id() -> &'static str {
    static SESSION_ID: OnceLock<String> = OnceLock::new();
    SESSION_ID.get_or_init(|| uuid::Uuid::new_v4().to_string())
}
