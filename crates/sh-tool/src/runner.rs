use std::path::{Path, PathBuf};

use regex::Regex;
use sh_api::{run_script, HostServices, RunReport};
use sh_core::{EnvironmentSnapshot, ExecutorConfig, ScriptData, StaticHost};
use sh_runtime::{ExecutionContext, INTERPRETER_VERSION};

use crate::source::{discover_cases, read_test_case};
use crate::{ShToolError, TestCase};

const HOST_NAME: &str = "sh-tool";

/// Result of one case file when running a whole directory.
#[derive(Debug)]
pub struct CaseOutcome {
    pub case_path: PathBuf,
    pub outcome: Result<RunReport, ShToolError>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Runs `case` with paths anchored at `case_dir`, against a stand-in host
/// with a fixed environment.
pub fn run_case(case_dir: &Path, case: &TestCase) -> Result<RunReport, ShToolError> {
    let mut script = ScriptData::for_script(case_dir.join(&case.script));
    if let Some(bundle) = &case.bundle {
        script = script.with_bundle(case_dir.join(bundle));
    }
    if let Some(config_script) = &case.config_script {
        script = script.with_config_script(case_dir.join(config_script));
    }

    let mut config = ExecutorConfig::default();
    config.variables = case.variables.clone();

    let mut context = ExecutionContext::new()
        .with_config(config)
        .with_environment(
            EnvironmentSnapshot::capture_from(|_| None).with_engine_version(INTERPRETER_VERSION),
        )
        .with_ui_application(StaticHost::new(HOST_NAME, env!("CARGO_PKG_VERSION")).into_ref());
    for path in &case.search_paths {
        context = context.with_search_path(case_dir.join(path));
    }
    for argument in &case.arguments {
        context = context.with_argument(argument.clone());
    }
    context.config_mode = case.flags.config_mode;
    context.debug_mode = case.flags.debug_mode;
    context.executed_from_ui = case.flags.executed_from_ui;

    let mut services = HostServices::new();
    Ok(run_script(&mut services, script, context)?)
}

pub fn assert_case(case_path: &Path) -> Result<RunReport, ShToolError> {
    let case = read_test_case(case_path)?;
    let case_dir = case_path.parent().unwrap_or_else(|| Path::new("."));
    let report = run_case(case_dir, &case)?;
    let expected = &case.expected;

    if report.result != expected.result {
        return Err(ShToolError::ResultMismatch {
            expected: expected.result,
            actual: report.result,
            message: report.message,
        });
    }

    if let Some(engine) = expected.engine {
        if report.engine_type != engine {
            return Err(ShToolError::EngineMismatch {
                expected: engine,
                actual: report.engine_type,
            });
        }
    }

    for fragment in &expected.message_contains {
        if !report.message.contains(fragment.as_str()) {
            return Err(ShToolError::MessageMismatch {
                fragment: fragment.clone(),
                message: report.message,
            });
        }
    }

    if let Some(pattern) = &expected.message_pattern {
        let regex = Regex::new(pattern).map_err(|source| ShToolError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        if !regex.is_match(&report.message) {
            return Err(ShToolError::MessagePatternMismatch {
                pattern: pattern.clone(),
                message: report.message,
            });
        }
    }

    for (key, value) in &expected.results {
        let actual = report.results.get(key);
        if actual != Some(value) {
            return Err(ShToolError::ResultValueMismatch {
                key: key.clone(),
                expected: value.clone(),
                actual: actual.cloned(),
            });
        }
    }

    if let Some(output) = &expected.output {
        if output != &report.output {
            let expected = serde_json::to_string(output).map_err(ShToolError::OutputSerialize)?;
            let actual =
                serde_json::to_string(&report.output).map_err(ShToolError::OutputSerialize)?;
            return Err(ShToolError::OutputMismatch { expected, actual });
        }
    }

    Ok(report)
}

/// Asserts every case under `cases_dir`. A failing case does not stop the
/// others; only discovery errors are returned as `Err`.
pub fn run_cases_in_dir(cases_dir: &Path) -> Result<Vec<CaseOutcome>, ShToolError> {
    Ok(discover_cases(cases_dir)?
        .into_iter()
        .map(|case_path| {
            let outcome = assert_case(&case_path);
            CaseOutcome { case_path, outcome }
        })
        .collect())
}
