mod case;
mod runner;
mod source;

pub use case::{CaseFlags, Expectation, TestCase, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, run_cases_in_dir, CaseOutcome};
pub use source::{discover_cases, read_test_case, CASE_FILE_SUFFIX};

use std::path::PathBuf;

use sh_core::{EngineType, ExecutionResult};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("No *.case.json files under {path}.")]
    CasesEmpty { path: PathBuf },
    #[error("Runtime error: {0}")]
    Runtime(#[from] sh_core::ScriptHostError),
    #[error("Expected result {expected}, actual {actual}. message={message}")]
    ResultMismatch {
        expected: ExecutionResult,
        actual: ExecutionResult,
        message: String,
    },
    #[error("Expected engine {expected}, actual {actual}.")]
    EngineMismatch {
        expected: EngineType,
        actual: EngineType,
    },
    #[error("Message does not contain \"{fragment}\". message={message}")]
    MessageMismatch { fragment: String, message: String },
    #[error("Invalid message pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("Message does not match /{pattern}/. message={message}")]
    MessagePatternMismatch { pattern: String, message: String },
    #[error("Result \"{key}\" mismatch. expected={expected} actual={actual:?}")]
    ResultValueMismatch {
        key: String,
        expected: String,
        actual: Option<String>,
    },
    #[error("Output mismatch. expected={expected} actual={actual}")]
    OutputMismatch { expected: String, actual: String },
    #[error("Failed to serialize output for diff: {0}")]
    OutputSerialize(serde_json::Error),
}
