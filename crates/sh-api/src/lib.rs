use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sh_core::{
    EngineType, ExecutionResult, ExecutorConfig, RuntimeType, ScriptData, ScriptHostError,
};
use sh_runtime::{
    Diagnostic, EngineRegistry, ExecutionContext, ExecutorOptions, OutputRegistry, ScriptExecutor,
    ScriptRuntime,
};
use tracing::debug;

/// Host-owned state that outlives single runs: engine handlers and the
/// console registry.
#[derive(Default)]
pub struct HostServices {
    pub engines: EngineRegistry,
    pub outputs: OutputRegistry,
}

impl HostServices {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Everything the host keeps from one run after the runtime is disposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub exec_id: String,
    pub engine_type: EngineType,
    pub runtime_type: RuntimeType,
    pub result: ExecutionResult,
    pub message: String,
    pub results: BTreeMap<String, String>,
    /// Console lines written by this run.
    pub output: Vec<String>,
    /// Failure log the run wrote. `None` when nothing was written.
    pub log_path: Option<PathBuf>,
}

/// Builds a runtime for `script`, runs it and disposes it.
pub fn run_script(
    services: &mut HostServices,
    script: ScriptData,
    context: ExecutionContext,
) -> Result<RunReport, ScriptHostError> {
    let output_id = script.command_unique_id.clone();
    let mut runtime = ScriptRuntime::new(script, context);
    let outcome = runtime.run(&services.engines, &mut services.outputs);

    let report = outcome.map(|result| RunReport {
        exec_id: runtime.exec_id().to_string(),
        engine_type: runtime.engine_type(),
        runtime_type: runtime.runtime_type(),
        result,
        message: runtime.trace_message().to_string(),
        results: runtime.results().cloned().unwrap_or_default(),
        output: services
            .outputs
            .find_console(&output_id)
            .map(|console| console.lines_for(runtime.exec_id()))
            .unwrap_or_default(),
        log_path: runtime.log_file().map(Path::to_path_buf),
    });
    runtime.dispose(&mut services.outputs);
    debug!(target: "scripthost::runtime", ok = report.is_ok(), "run_script finished");
    report
}

/// Compiles `source_path` without running it. An empty list means the
/// script is well formed.
pub fn check_script(
    source_path: &Path,
    config: &ExecutorConfig,
) -> Result<Vec<Diagnostic>, ScriptHostError> {
    let executor = ScriptExecutor::new(ExecutorOptions::from(config));
    let reporter = executor.compile_only(source_path)?;
    Ok(reporter.errors().to_vec())
}
