mod session;
mod traceback;

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rhai::{Dynamic, Map, Scope, INT};
use sh_core::{ExecutionResult, ExecutorConfig, HostHandle, HostRef, ScriptHostError, ScriptValue};
use tracing::{debug, info, instrument, warn};

use crate::globals;
use crate::helpers::host_binding::HostBinding;
use crate::helpers::rhai_bridge::{
    dynamic_to_result_code, dynamic_to_results_map, dynamic_to_text, script_value_to_dynamic,
};
use crate::{ErrorReporter, OutputStream};
use session::InterpreterSession;

pub use traceback::{EXECUTOR_TRACEBACK_HEADER, SCRIPT_TRACEBACK_HEADER};

/// Interpreter limits applied to every fresh interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorOptions {
    pub strict_variables: bool,
    /// 0 disables the operation limit.
    pub max_operations: u64,
    pub max_call_levels: usize,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self::from(&ExecutorConfig::default())
    }
}

impl From<&ExecutorConfig> for ExecutorOptions {
    fn from(config: &ExecutorConfig) -> Self {
        Self {
            strict_variables: config.strict_variables,
            max_operations: config.max_operations,
            max_call_levels: config.max_call_levels,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub result: ExecutionResult,
    pub message: String,
    pub results: BTreeMap<String, String>,
    /// Set when the script ended through `exit()`.
    pub exit_code: Option<i64>,
    /// Failure log this run wrote, if any.
    pub log_file: Option<PathBuf>,
}

impl ExecutionOutcome {
    pub fn succeeded() -> Self {
        Self::with_result(ExecutionResult::Succeeded, String::new())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::with_result(ExecutionResult::Failed, message.into())
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::with_result(ExecutionResult::Cancelled, message.into())
    }

    fn with_result(result: ExecutionResult, message: String) -> Self {
        Self {
            result,
            message,
            results: BTreeMap::new(),
            exit_code: None,
            log_file: None,
        }
    }

    fn with_log_file(mut self, log_file: Option<PathBuf>) -> Self {
        self.log_file = log_file;
        self
    }
}

/// Runs one source file in a fresh interpreter per call.
///
/// Nothing survives between calls: each `execute` builds an interpreter,
/// injects the scope, runs, reads the command slots back and drops the
/// interpreter on every path.
pub struct ScriptExecutor {
    host: Option<HostHandle>,
    startup_host: Option<HostRef>,
    output: Option<Rc<OutputStream>>,
    options: ExecutorOptions,
    live: Rc<Cell<usize>>,
}

impl ScriptExecutor {
    pub fn new(options: ExecutorOptions) -> Self {
        Self {
            host: None,
            startup_host: None,
            output: None,
            options,
            live: Rc::new(Cell::new(0)),
        }
    }

    /// Host handle exposed to scripts as `__host__`.
    pub fn with_host(mut self, host: Option<HostHandle>) -> Self {
        self.host = host;
        self
    }

    /// Startup-time application exposed as `__uicontrolledapp__`.
    pub fn with_startup_host(mut self, host: Option<HostRef>) -> Self {
        self.startup_host = host;
        self
    }

    /// Destination of `print` and `debug`. Without one they go to tracing.
    pub fn with_output(mut self, output: Option<Rc<OutputStream>>) -> Self {
        self.output = output;
        self
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Interpreters currently alive. 0 whenever no `execute` is in flight.
    pub fn live_interpreters(&self) -> usize {
        self.live.get()
    }

    /// Compiles and runs `source_path`.
    ///
    /// The script's own directory is searched for imports first, then
    /// `search_paths` in order. Compile errors produce `Cancelled` without
    /// running any statement. Runtime errors produce `Failed`, except the
    /// controlled exit raised by `exit()`, which produces `Succeeded`. The
    /// message of both failure kinds is also written to `log_path`.
    #[instrument(
        target = "scripthost::executor",
        skip_all,
        fields(source = %source_path.display())
    )]
    pub fn execute(
        &self,
        source_path: &Path,
        search_paths: &[PathBuf],
        log_path: Option<&Path>,
        variables: &BTreeMap<String, ScriptValue>,
    ) -> ExecutionOutcome {
        let source = match fs::read_to_string(source_path) {
            Ok(source) => source,
            Err(error) => {
                warn!(target: "scripthost::executor", %error, "script source unreadable");
                return ExecutionOutcome::failed(error.to_string());
            }
        };

        let resolution_paths = resolution_paths(source_path, search_paths);
        let session = InterpreterSession::open(
            &self.options,
            &self.live,
            &resolution_paths,
            self.output.clone(),
        );
        let mut scope = self.build_scope(source_path, variables);

        let mut reporter = ErrorReporter::new();
        let Some(ast) = session.compile(&scope, &source, &mut reporter) else {
            let message = traceback::compile_failure_message(&reporter);
            info!(
                target: "scripthost::executor",
                diagnostics = reporter.count(),
                "script failed to compile"
            );
            let log_file = write_log(log_path, &message);
            return ExecutionOutcome::cancelled(message).with_log_file(log_file);
        };

        let outcome = match session.run(&mut scope, &ast) {
            Ok(()) => read_back(&scope, None),
            Err(error) => match traceback::exit_code(&error) {
                Some(code) => {
                    debug!(target: "scripthost::executor", code, "script exited");
                    read_back(&scope, Some(code))
                }
                None => {
                    let message = traceback::runtime_failure_message(source_path, &error);
                    info!(target: "scripthost::executor", %error, "script raised an error");
                    let log_file = write_log(log_path, &message);
                    ExecutionOutcome::failed(message).with_log_file(log_file)
                }
            },
        };
        drop(session);
        outcome
    }

    /// Compiles `source_path` without running it and returns the collected
    /// diagnostics. An empty reporter means the source is well formed.
    pub fn compile_only(&self, source_path: &Path) -> Result<ErrorReporter, ScriptHostError> {
        let source = fs::read_to_string(source_path).map_err(|error| {
            ScriptHostError::new(
                "EXECUTOR_SOURCE_READ",
                format!("Failed to read \"{}\": {}", source_path.display(), error),
            )
        })?;
        let resolution_paths = resolution_paths(source_path, &[]);
        let session =
            InterpreterSession::open(&self.options, &self.live, &resolution_paths, None);
        let scope = self.build_scope(source_path, &BTreeMap::new());
        let mut reporter = ErrorReporter::new();
        session.compile(&scope, &source, &mut reporter);
        Ok(reporter)
    }

    /// Later pushes shadow earlier ones, so caller variables override the
    /// defaults and the host constants override everything.
    fn build_scope(
        &self,
        source_path: &Path,
        variables: &BTreeMap<String, ScriptValue>,
    ) -> Scope<'static> {
        let mut scope = Scope::new();
        scope.push(globals::FILE, source_path.display().to_string());
        scope.push(globals::MESSAGE, String::new());
        scope.push(globals::RESULT, ExecutionResult::Succeeded.code() as INT);
        scope.push(globals::RESULTS, Map::new());

        for (name, value) in variables {
            scope.push_dynamic(name.clone(), script_value_to_dynamic(value));
        }

        scope.push_constant(globals::NAME, globals::MAIN_MODULE.to_string());
        match &self.host {
            Some(handle) => {
                scope.push_constant(globals::HOST, HostBinding::new(handle.clone()));
            }
            None => {
                scope.push_constant_dynamic(globals::HOST, Dynamic::UNIT);
            }
        }
        if let Some(host) = &self.startup_host {
            scope.push_constant(globals::UI_CONTROLLED_APP, HostBinding::startup(Rc::clone(host)));
        }
        scope
    }
}

impl Default for ScriptExecutor {
    fn default() -> Self {
        Self::new(ExecutorOptions::default())
    }
}

fn resolution_paths(source_path: &Path, search_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(search_paths.len() + 1);
    if let Some(parent) = source_path.parent() {
        let parent = if parent.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            parent.to_path_buf()
        };
        paths.push(parent);
    }
    for path in search_paths {
        if !paths.contains(path) {
            paths.push(path.clone());
        }
    }
    paths
}

fn read_back(scope: &Scope, exit_code: Option<INT>) -> ExecutionOutcome {
    let result = match exit_code {
        Some(_) => ExecutionResult::Succeeded,
        None => scope
            .get_value::<Dynamic>(globals::RESULT)
            .and_then(|value| {
                let code = dynamic_to_result_code(&value);
                if code.is_none() {
                    warn!(
                        target: "scripthost::executor",
                        value = %value,
                        "unrecognized {}; treating as succeeded",
                        globals::RESULT
                    );
                }
                code
            })
            .unwrap_or(ExecutionResult::Succeeded),
    };
    let message = scope
        .get_value::<Dynamic>(globals::MESSAGE)
        .map(dynamic_to_text)
        .unwrap_or_default();
    let results = scope
        .get_value::<Dynamic>(globals::RESULTS)
        .map(dynamic_to_results_map)
        .unwrap_or_default();

    ExecutionOutcome {
        result,
        message,
        results,
        exit_code: exit_code.map(|code| code as i64),
        log_file: None,
    }
}

/// Writes the failure log and returns its path when the write went through.
fn write_log(log_path: Option<&Path>, message: &str) -> Option<PathBuf> {
    let path = log_path?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(error) = fs::create_dir_all(parent) {
                warn!(target: "scripthost::executor", %error, path = %parent.display(), "cannot create log directory");
                return None;
            }
        }
    }
    match fs::write(path, message) {
        Ok(()) => {
            debug!(target: "scripthost::executor", path = %path.display(), "error log written");
            Some(path.to_path_buf())
        }
        Err(error) => {
            warn!(target: "scripthost::executor", %error, path = %path.display(), "cannot write error log");
            None
        }
    }
}

#[cfg(test)]
mod tests;
