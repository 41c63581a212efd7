use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sh_core::{EngineType, ExecutionResult, ScriptValue};

pub const TESTCASE_SCHEMA_V1: &str = "sh-tool-case.v1";

/// One scripted run and what it must produce. Paths are relative to the
/// directory holding the case file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    pub script: PathBuf,
    #[serde(default)]
    pub bundle: Option<PathBuf>,
    #[serde(default)]
    pub config_script: Option<PathBuf>,
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, ScriptValue>,
    #[serde(default)]
    pub flags: CaseFlags,
    pub expected: Expectation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseFlags {
    #[serde(default)]
    pub config_mode: bool,
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default)]
    pub executed_from_ui: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    pub result: ExecutionResult,
    #[serde(default)]
    pub engine: Option<EngineType>,
    #[serde(default)]
    pub message_contains: Vec<String>,
    #[serde(default)]
    pub message_pattern: Option<String>,
    /// Keys that must be present in the results map; other keys are ignored.
    #[serde(default)]
    pub results: BTreeMap<String, String>,
    /// Exact console lines of the run, when given.
    #[serde(default)]
    pub output: Option<Vec<String>>,
}
