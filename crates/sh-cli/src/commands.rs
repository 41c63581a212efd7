use std::path::{Path, PathBuf};

use sh_api::{check_script, run_script, HostServices, RunReport};
use sh_core::{ExecutionResult, ExecutorConfig, ScriptData, ScriptHostError, ScriptValue, StaticHost};
use sh_runtime::ExecutionContext;
use sh_tool::run_cases_in_dir;
use tracing::info;

use crate::error_map::{json_string, map_cli_cases, map_cli_json, map_cli_path};
use crate::{CheckArgs, RunArgs, TestArgs};

const HOST_NAME: &str = "sh-cli";

/// Process exit code for a run outcome.
pub(crate) fn exit_code_for(result: ExecutionResult) -> i32 {
    match result {
        ExecutionResult::Succeeded => 0,
        ExecutionResult::Failed => 1,
        ExecutionResult::Cancelled => 2,
    }
}

pub(crate) fn parse_var(raw: &str) -> Result<(String, ScriptValue), ScriptHostError> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), ScriptValue::parse_literal(value)))
        }
        _ => Err(ScriptHostError::new(
            "CLI_VAR_INVALID",
            format!("Expected name=value, got \"{}\".", raw),
        )),
    }
}

pub(crate) fn absolute(path: &Path) -> Result<PathBuf, ScriptHostError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir().map_err(map_cli_path)?.join(path))
}

fn load_config(path: Option<&Path>) -> Result<ExecutorConfig, ScriptHostError> {
    match path {
        Some(path) => ExecutorConfig::load(&absolute(path)?),
        None => Ok(ExecutorConfig::default()),
    }
}

pub(crate) fn run_command(args: RunArgs) -> Result<i32, ScriptHostError> {
    let mut config = load_config(args.config.as_deref())?;
    for raw in &args.vars {
        let (name, value) = parse_var(raw)?;
        config.variables.insert(name, value);
    }

    let mut script = ScriptData::for_script(absolute(&args.script)?);
    if let Some(bundle) = &args.bundle {
        script = script.with_bundle(absolute(bundle)?);
    }
    if let Some(config_script) = &args.config_script {
        script = script.with_config_script(absolute(config_script)?);
    }

    let mut context = ExecutionContext::new()
        .with_config(config)
        .with_ui_application(StaticHost::new(HOST_NAME, env!("CARGO_PKG_VERSION")).into_ref());
    for path in &args.search_paths {
        context = context.with_search_path(absolute(path)?);
    }
    for argument in args.arguments {
        context = context.with_argument(argument);
    }
    context.log_path = args.log_file.as_deref().map(absolute).transpose()?;
    context.config_mode = args.config_mode;
    context.debug_mode = args.debug;

    let mut services = HostServices::new();
    let report = run_script(&mut services, script, context)?;
    emit_report(&report)?;
    Ok(exit_code_for(report.result))
}

fn emit_report(report: &RunReport) -> Result<(), ScriptHostError> {
    println!("RESULT:{}", report.result.as_str().to_ascii_uppercase());
    println!("ENGINE:{}", report.engine_type);
    println!("EXEC_ID:{}", report.exec_id);
    for line in &report.output {
        println!("OUTPUT:{}", line);
    }
    println!("MESSAGE_JSON:{}", json_string(&report.message));
    println!(
        "RESULTS_JSON:{}",
        serde_json::to_string(&report.results).map_err(map_cli_json)?
    );
    println!(
        "LOG_FILE:{}",
        report
            .log_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "NONE".to_string())
    );
    Ok(())
}

pub(crate) fn check_command(args: CheckArgs) -> Result<i32, ScriptHostError> {
    let config = load_config(args.config.as_deref())?;
    let diagnostics = check_script(&absolute(&args.script)?, &config)?;
    if diagnostics.is_empty() {
        println!("RESULT:OK");
        return Ok(0);
    }
    println!("RESULT:INVALID");
    for diagnostic in &diagnostics {
        println!(
            "DIAGNOSTIC:{}|{}",
            diagnostic.line,
            json_string(&diagnostic.message)
        );
    }
    Ok(exit_code_for(ExecutionResult::Cancelled))
}

pub(crate) fn test_command(args: TestArgs) -> Result<i32, ScriptHostError> {
    let outcomes = run_cases_in_dir(&absolute(&args.cases_dir)?).map_err(map_cli_cases)?;
    let mut failed = 0usize;
    for outcome in &outcomes {
        match &outcome.outcome {
            Ok(_) => println!("CASE:PASS|{}", outcome.case_path.display()),
            Err(error) => {
                failed += 1;
                println!(
                    "CASE:FAIL|{}|{}",
                    outcome.case_path.display(),
                    json_string(&error.to_string())
                );
            }
        }
    }
    info!(total = outcomes.len(), failed, "test cases finished");
    println!("PASSED:{}", outcomes.len() - failed);
    println!("FAILED:{}", failed);
    if failed == 0 {
        println!("RESULT:OK");
        Ok(0)
    } else {
        println!("RESULT:FAILED");
        Ok(1)
    }
}
