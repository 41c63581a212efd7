use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Version tag of the closed set of recognized script kinds.
pub const SCRIPT_KINDS_VERSION: &str = "script-kinds.v1";

/// Result code surfaced to the host after one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionResult {
    Succeeded,
    Cancelled,
    Failed,
}

impl ExecutionResult {
    /// Numeric code scripts use in `__result__`.
    pub fn code(self) -> i64 {
        match self {
            Self::Succeeded => 0,
            Self::Cancelled => 1,
            Self::Failed => -1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Succeeded),
            1 => Some(Self::Cancelled),
            -1 => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "succeeded" => Some(Self::Succeeded),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine variant chosen for a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    /// Interpreted scripting engine (Rhai).
    Script,
    /// Compiled-script engine provided by the host.
    Compiled,
    /// Visual-programming engine provided by the host.
    Visual,
    /// Precompiled invoke of a bundle's assembly, provided by the host.
    Invoke,
    Unknown,
}

impl EngineType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Compiled => "compiled",
            Self::Visual => "visual",
            Self::Invoke => "invoke",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeType {
    ExternalCommand,
    EventHandler,
}

impl RuntimeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExternalCommand => "external-command",
            Self::EventHandler => "event-handler",
        }
    }
}

/// Script kind recognized from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Script,
    Compiled,
    Visual,
}

impl ScriptKind {
    const SCRIPT_EXTENSIONS: &'static [&'static str] = &["rhai"];
    const COMPILED_EXTENSIONS: &'static [&'static str] = &["cs", "vb"];
    const VISUAL_EXTENSIONS: &'static [&'static str] = &["dyn"];

    pub fn of(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        let extension = extension.as_str();
        if Self::SCRIPT_EXTENSIONS.contains(&extension) {
            Some(Self::Script)
        } else if Self::COMPILED_EXTENSIONS.contains(&extension) {
            Some(Self::Compiled)
        } else if Self::VISUAL_EXTENSIONS.contains(&extension) {
            Some(Self::Visual)
        } else {
            None
        }
    }
}

/// Kind of the bundle directory that owns a command's scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    PushButton,
    SmartButton,
    InvokeButton,
    LinkButton,
    UrlButton,
    ContentButton,
    Other,
}

impl BundleKind {
    pub fn of(bundle_dir: &Path) -> Self {
        let Some(extension) = bundle_dir.extension().and_then(|ext| ext.to_str()) else {
            return Self::Other;
        };
        match extension.to_ascii_lowercase().as_str() {
            "pushbutton" => Self::PushButton,
            "smartbutton" => Self::SmartButton,
            "invokebutton" => Self::InvokeButton,
            "linkbutton" => Self::LinkButton,
            "urlbutton" => Self::UrlButton,
            "contentbutton" => Self::ContentButton,
            _ => Self::Other,
        }
    }
}

/// What the host knows about the command being run. Paths are resolved
/// against the file system at run time, never cached by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptData {
    pub script_path: PathBuf,
    #[serde(default)]
    pub config_script_path: Option<PathBuf>,
    #[serde(default)]
    pub command_bundle: Option<PathBuf>,
    #[serde(default)]
    pub command_name: String,
    #[serde(default)]
    pub command_unique_id: String,
    #[serde(default)]
    pub command_control_id: String,
}

impl ScriptData {
    /// Builds script data for a bare script file, deriving the command name
    /// and id from the file stem.
    pub fn for_script(script_path: impl Into<PathBuf>) -> Self {
        let script_path = script_path.into();
        let stem = script_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("script")
            .to_string();
        Self {
            command_unique_id: format!("cmd-{}", stem.to_ascii_lowercase()),
            command_control_id: format!("control-{}", stem.to_ascii_lowercase()),
            command_name: stem,
            script_path,
            config_script_path: None,
            command_bundle: None,
        }
    }

    pub fn with_bundle(mut self, bundle_dir: impl Into<PathBuf>) -> Self {
        self.command_bundle = Some(bundle_dir.into());
        self
    }

    pub fn with_config_script(mut self, config_script_path: impl Into<PathBuf>) -> Self {
        self.config_script_path = Some(config_script_path.into());
        self
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn execution_result_codes_round_trip_through_names() {
        for result in [
            ExecutionResult::Succeeded,
            ExecutionResult::Cancelled,
            ExecutionResult::Failed,
        ] {
            assert_eq!(ExecutionResult::from_code(result.code()), Some(result));
            assert_eq!(ExecutionResult::from_name(result.as_str()), Some(result));
        }
        assert_eq!(ExecutionResult::from_code(5), None);
        assert_eq!(
            ExecutionResult::from_name(" Cancelled "),
            Some(ExecutionResult::Cancelled)
        );
    }

    #[test]
    fn script_kind_matches_extensions_case_insensitively() {
        assert_eq!(ScriptKind::of(Path::new("a/b.rhai")), Some(ScriptKind::Script));
        assert_eq!(ScriptKind::of(Path::new("b.RHAI")), Some(ScriptKind::Script));
        assert_eq!(ScriptKind::of(Path::new("b.cs")), Some(ScriptKind::Compiled));
        assert_eq!(ScriptKind::of(Path::new("b.vb")), Some(ScriptKind::Compiled));
        assert_eq!(ScriptKind::of(Path::new("b.dyn")), Some(ScriptKind::Visual));
        assert_eq!(ScriptKind::of(Path::new("b.txt")), None);
        assert_eq!(ScriptKind::of(Path::new("noext")), None);
    }

    #[test]
    fn bundle_kind_reads_directory_extension() {
        assert_eq!(
            BundleKind::of(Path::new("Tools.tab/Run.invokebutton")),
            BundleKind::InvokeButton
        );
        assert_eq!(
            BundleKind::of(Path::new("Run.pushbutton")),
            BundleKind::PushButton
        );
        assert_eq!(BundleKind::of(Path::new("Run")), BundleKind::Other);
    }

    #[test]
    fn for_script_derives_identity_from_stem() {
        let data = ScriptData::for_script("/tmp/Hello.rhai");
        assert_eq!(data.command_name, "Hello");
        assert_eq!(data.command_unique_id, "cmd-hello");
        assert!(data.command_bundle.is_none());
    }
}
