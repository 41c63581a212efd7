use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use sh_core::{
    EngineType, EnvironmentSnapshot, EventSender, ExecutionResult, HostHandle, HostKind, HostRef,
    RuntimeType, ScriptData, ScriptHostError, ScriptValue,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::engines::{EngineRegistry, EngineRequest};
use crate::executor::{ExecutionOutcome, ExecutorOptions, ScriptExecutor};
use crate::{
    capture_environment, globals, select_engine, ConsoleSpec, ExecutionContext, OutputHandle,
    OutputRegistry, OutputStream, ScriptConsole,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Created,
    Configured,
    Running,
    Succeeded,
    Cancelled,
    Failed,
    Disposed,
}

impl RuntimeState {
    fn finished(result: ExecutionResult) -> Self {
        match result {
            ExecutionResult::Succeeded => Self::Succeeded,
            ExecutionResult::Cancelled => Self::Cancelled,
            ExecutionResult::Failed => Self::Failed,
        }
    }
}

#[derive(Default)]
struct HostHandles {
    application: Option<HostRef>,
    controlled_application: Option<HostRef>,
    ui_application: Option<HostRef>,
    ui_controlled_application: Option<HostRef>,
}

impl HostHandles {
    /// Event-sender slot first, then direct context fields on top.
    fn derive(context: &ExecutionContext) -> Self {
        let mut handles = Self::default();
        if let Some(sender) = context.event_sender() {
            let host = Some(Rc::clone(sender.host()));
            match sender.kind() {
                HostKind::Application => handles.application = host,
                HostKind::ControlledApplication => handles.controlled_application = host,
                HostKind::UiApplication => handles.ui_application = host,
                HostKind::UiControlledApplication => handles.ui_controlled_application = host,
            }
        }
        if let Some(host) = &context.application {
            handles.application = Some(Rc::clone(host));
        }
        if let Some(host) = &context.controlled_application {
            handles.controlled_application = Some(Rc::clone(host));
        }
        if let Some(host) = &context.ui_application {
            handles.ui_application = Some(Rc::clone(host));
        }
        if let Some(host) = &context.ui_controlled_application {
            handles.ui_controlled_application = Some(Rc::clone(host));
        }
        handles
    }
}

/// One script execution, from identity to outcome.
///
/// A runtime runs at most once. Consoles live in the host's
/// [`OutputRegistry`] and the runtime only keeps a handle to its console.
/// The runtime owns its output stream, so dropping it without
/// [`Self::dispose`] still frees the stream.
pub struct ScriptRuntime {
    exec_id: String,
    exec_timestamp: DateTime<Utc>,
    script: ScriptData,
    context: ExecutionContext,
    environment: EnvironmentSnapshot,
    handles: HostHandles,
    engine_type: OnceCell<EngineType>,
    console: Option<OutputHandle>,
    stream: Option<(OutputHandle, Rc<OutputStream>)>,
    results: Option<BTreeMap<String, String>>,
    execution_result: Option<ExecutionResult>,
    trace_message: String,
    log_file: Option<PathBuf>,
    state: RuntimeState,
}

impl ScriptRuntime {
    pub fn new(script: ScriptData, context: ExecutionContext) -> Self {
        let environment = context
            .environment
            .clone()
            .unwrap_or_else(capture_environment);
        let mut runtime = Self {
            exec_id: Uuid::new_v4().simple().to_string(),
            exec_timestamp: Utc::now(),
            script,
            context,
            environment,
            handles: HostHandles::default(),
            engine_type: OnceCell::new(),
            console: None,
            stream: None,
            results: None,
            execution_result: None,
            trace_message: String::new(),
            log_file: None,
            state: RuntimeState::Created,
        };
        runtime.handles = HostHandles::derive(&runtime.context);
        runtime.state = RuntimeState::Configured;
        debug!(
            target: "scripthost::runtime",
            exec_id = runtime.exec_id.as_str(),
            command = runtime.script.command_unique_id.as_str(),
            "runtime configured"
        );
        runtime
    }

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    pub fn exec_id(&self) -> &str {
        &self.exec_id
    }

    pub fn exec_timestamp(&self) -> DateTime<Utc> {
        self.exec_timestamp
    }

    pub fn script(&self) -> &ScriptData {
        &self.script
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn environment(&self) -> &EnvironmentSnapshot {
        &self.environment
    }

    /// Wires the invoking event after construction. Handles are derived
    /// again so the new sender is visible to the script.
    pub fn set_event_sender(&mut self, sender: Option<EventSender>) {
        self.context.set_event_sender(sender);
        self.handles = HostHandles::derive(&self.context);
    }

    pub fn set_event_args(&mut self, args: Option<ScriptValue>) {
        self.context.set_event_args(args);
    }

    /// Computed on every call: event wiring may be set after construction.
    pub fn runtime_type(&self) -> RuntimeType {
        if self.context.event_sender().is_some() || self.context.event_args().is_some() {
            RuntimeType::EventHandler
        } else {
            RuntimeType::ExternalCommand
        }
    }

    /// Resolved on first access and fixed for the rest of the run.
    pub fn engine_type(&self) -> EngineType {
        *self.engine_type.get_or_init(|| {
            select_engine(
                &self.script_source_file(),
                self.script.command_bundle.as_deref(),
            )
        })
    }

    pub fn engine_version(&self) -> &str {
        match self.engine_type() {
            EngineType::Script => &self.environment.engine_version,
            _ => &self.environment.runtime_version,
        }
    }

    pub fn runtime_version(&self) -> &str {
        &self.environment.runtime_version
    }

    pub fn host_version(&self) -> &str {
        &self.environment.host_version
    }

    pub fn session_id(&self) -> &str {
        &self.environment.session_id
    }

    pub fn clone_name(&self) -> &str {
        &self.environment.clone_name
    }

    /// The config script in config mode when one is set, the main script
    /// otherwise.
    pub fn script_source_file(&self) -> PathBuf {
        if self.context.config_mode {
            if let Some(config_script) = &self.script.config_script_path {
                if !config_script.as_os_str().is_empty() {
                    return config_script.clone();
                }
            }
        }
        self.script.script_path.clone()
    }

    /// Modification time of the source file in milliseconds since the Unix
    /// epoch, `None` when the file is missing.
    pub fn source_signature(&self) -> Option<i64> {
        let modified = fs::metadata(self.script_source_file())
            .and_then(|metadata| metadata.modified())
            .ok()?;
        Some(DateTime::<Utc>::from(modified).timestamp_millis())
    }

    /// Command data first, then the UI application, then the raw application.
    pub fn application(&self) -> Option<HostRef> {
        self.ui_application()
            .or_else(|| self.handles.application.clone())
    }

    pub fn ui_application(&self) -> Option<HostRef> {
        match &self.context.command {
            Some(command) => Some(Rc::clone(&command.ui_application)),
            None => self.handles.ui_application.clone(),
        }
    }

    pub fn controlled_application(&self) -> Option<HostRef> {
        self.handles.controlled_application.clone()
    }

    pub fn ui_controlled_application(&self) -> Option<HostRef> {
        self.handles.ui_controlled_application.clone()
    }

    /// Empty when no document is open.
    pub fn document_name(&self) -> String {
        self.application()
            .and_then(|host| host.active_document())
            .map(|document| document.title)
            .unwrap_or_default()
    }

    pub fn document_path(&self) -> String {
        self.application()
            .and_then(|host| host.active_document())
            .map(|document| document.path)
            .unwrap_or_default()
    }

    /// Console for this command: the live one when the host still keeps it,
    /// otherwise a new one registered with the host.
    pub fn output_window(
        &mut self,
        outputs: &mut OutputRegistry,
    ) -> Result<Rc<ScriptConsole>, ScriptHostError> {
        self.ensure_not_disposed()?;
        if let Some(console) = self.console.and_then(|handle| outputs.console(handle)) {
            return Ok(console);
        }
        let (handle, console) = outputs.console_for(ConsoleSpec {
            output_id: self.script.command_unique_id.clone(),
            title: self.script.command_name.clone(),
            app_version: format!(
                "{}:{}:{}",
                self.environment.runtime_version,
                self.engine_version(),
                self.environment.host_version
            ),
            debug_mode: self.context.debug_mode,
        });
        self.console = Some(handle);
        Ok(console)
    }

    /// Output stream of this run, rebuilt when its console was replaced.
    pub fn output_stream(
        &mut self,
        outputs: &mut OutputRegistry,
    ) -> Result<Rc<OutputStream>, ScriptHostError> {
        let console = self.output_window(outputs)?;
        if let Some((_, stream)) = &self.stream {
            let current = stream
                .console()
                .is_some_and(|feeds| Rc::ptr_eq(&feeds, &console));
            if current {
                return Ok(Rc::clone(stream));
            }
        }
        if let Some((stale, _)) = self.stream.take() {
            outputs.release_stream(stale);
        }
        let (handle, stream) = outputs.stream_for(&self.exec_id, &console);
        self.stream = Some((handle, Rc::clone(&stream)));
        Ok(stream)
    }

    pub fn results(&self) -> Option<&BTreeMap<String, String>> {
        self.results.as_ref()
    }

    pub fn results_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.results.get_or_insert_with(BTreeMap::new)
    }

    pub fn execution_result(&self) -> Option<ExecutionResult> {
        self.execution_result
    }

    pub fn trace_message(&self) -> &str {
        &self.trace_message
    }

    /// Failure log the run actually wrote. `None` before the run, after a
    /// clean run, and when the write failed.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Log file for failures: the context's explicit path, otherwise
    /// `<logDirectory>/<execId>.log` when the config names a directory.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.context.log_path.clone().or_else(|| {
            self.context
                .config
                .resolved_log_directory()
                .map(|dir| dir.join(format!("{}.log", self.exec_id)))
        })
    }

    /// Runs the script once. Script failures are reported through the
    /// returned result and [`Self::trace_message`]; `Err` is only returned
    /// for a runtime that was disposed or already ran.
    #[instrument(
        target = "scripthost::runtime",
        skip_all,
        fields(exec_id = %self.exec_id, command = %self.script.command_unique_id)
    )]
    pub fn run(
        &mut self,
        engines: &EngineRegistry,
        outputs: &mut OutputRegistry,
    ) -> Result<ExecutionResult, ScriptHostError> {
        self.ensure_not_disposed()?;
        if self.state != RuntimeState::Configured {
            return Err(ScriptHostError::new(
                "RUNTIME_ALREADY_RAN",
                format!("Runtime {} has already run.", self.exec_id),
            ));
        }
        self.state = RuntimeState::Running;

        let engine_type = self.engine_type();
        info!(
            target: "scripthost::runtime",
            engine = engine_type.as_str(),
            runtime_type = self.runtime_type().as_str(),
            refresh_engine = self.context.refresh_engine,
            "running script"
        );
        let outcome = match engine_type {
            EngineType::Unknown => {
                info!(
                    target: "scripthost::runtime",
                    script = %self.script_source_file().display(),
                    "no engine for script; skipping"
                );
                ExecutionOutcome::succeeded()
            }
            EngineType::Script => self.run_script(outputs)?,
            other => self.run_handler(other, engines, outputs)?,
        };
        Ok(self.finish(outcome))
    }

    /// Clears every handle the runtime holds, the results map and its output
    /// stream. The console stays with the host. The result code and trace
    /// message stay readable. Safe to call repeatedly.
    pub fn dispose(&mut self, outputs: &mut OutputRegistry) {
        if let Some((stream, _)) = self.stream.take() {
            outputs.release_stream(stream);
        }
        self.console = None;
        self.results = None;
        self.handles = HostHandles::default();
        self.context.dispose();
        if self.state != RuntimeState::Disposed {
            debug!(target: "scripthost::runtime", exec_id = self.exec_id.as_str(), "runtime disposed");
        }
        self.state = RuntimeState::Disposed;
    }

    fn run_script(&mut self, outputs: &mut OutputRegistry) -> Result<ExecutionOutcome, ScriptHostError> {
        let stream = self.output_stream(outputs)?;
        let executor = ScriptExecutor::new(ExecutorOptions::from(&self.context.config))
            .with_host(self.host_handle())
            .with_startup_host(self.handles.ui_controlled_application.clone())
            .with_output(Some(stream));

        let mut search_paths = self.context.search_paths.clone();
        search_paths.extend(self.context.config.resolved_search_paths());
        let log_path = self.log_path();
        let source_path = self.script_source_file();

        Ok(executor.execute(
            &source_path,
            &search_paths,
            log_path.as_deref(),
            &self.script_variables(),
        ))
    }

    fn run_handler(
        &mut self,
        engine_type: EngineType,
        engines: &EngineRegistry,
        outputs: &mut OutputRegistry,
    ) -> Result<ExecutionOutcome, ScriptHostError> {
        let Some(handler) = engines.get(engine_type) else {
            warn!(
                target: "scripthost::runtime",
                engine = engine_type.as_str(),
                "no handler registered"
            );
            return Ok(ExecutionOutcome::failed(format!(
                "No engine handler is registered for \"{}\" scripts.",
                engine_type
            )));
        };
        let output = self.output_stream(outputs)?;
        let request = EngineRequest {
            source_path: self.script_source_file(),
            script: self.script.clone(),
            arguments: self.context.arguments.clone(),
            exec_id: self.exec_id.clone(),
            host: self.host_handle(),
            output: Some(output),
        };
        Ok(handler.execute(&request))
    }

    fn finish(&mut self, outcome: ExecutionOutcome) -> ExecutionResult {
        let ExecutionOutcome {
            result,
            message,
            results,
            exit_code,
            log_file,
        } = outcome;
        if !results.is_empty() {
            self.results_mut().extend(results);
        }
        self.execution_result = Some(result);
        self.trace_message = message;
        self.log_file = log_file;
        self.state = RuntimeState::finished(result);
        info!(
            target: "scripthost::runtime",
            result = result.as_str(),
            exit_code = exit_code.unwrap_or_default(),
            "script finished"
        );
        result
    }

    /// Handle exposed as `__host__`: the richest one available.
    fn host_handle(&self) -> Option<HostHandle> {
        if let Some(host) = self.ui_application() {
            return Some(HostHandle::UiApplication(host));
        }
        if let Some(host) = &self.handles.application {
            return Some(HostHandle::Application(Rc::clone(host)));
        }
        if let Some(host) = &self.handles.controlled_application {
            return Some(HostHandle::ControlledApplication(Rc::clone(host)));
        }
        self.handles
            .ui_controlled_application
            .as_ref()
            .map(|host| HostHandle::UiControlledApplication(Rc::clone(host)))
    }

    fn script_variables(&self) -> BTreeMap<String, ScriptValue> {
        let mut variables = BTreeMap::from([
            (
                globals::VARS.to_string(),
                ScriptValue::Map(self.context.config.variables.clone()),
            ),
            (
                globals::ARGS.to_string(),
                ScriptValue::Array(
                    self.context
                        .arguments
                        .iter()
                        .map(|argument| ScriptValue::from(argument.as_str()))
                        .collect(),
                ),
            ),
            (
                globals::ELEMENTS.to_string(),
                ScriptValue::Array(
                    self.context
                        .command
                        .iter()
                        .flat_map(|command| command.selected_elements.iter())
                        .map(|id| ScriptValue::Int(*id))
                        .collect(),
                ),
            ),
            (globals::EXEC_ID.to_string(), ScriptValue::from(self.exec_id.as_str())),
            (
                globals::CONFIG_MODE.to_string(),
                ScriptValue::Bool(self.context.config_mode),
            ),
            (
                globals::DEBUG_MODE.to_string(),
                ScriptValue::Bool(self.context.debug_mode),
            ),
            (
                globals::FROM_UI.to_string(),
                ScriptValue::Bool(self.context.executed_from_ui),
            ),
            (globals::ENV.to_string(), self.environment.to_value()),
        ]);
        if let Some(args) = self.context.event_args() {
            variables.insert(globals::EVENT_ARGS.to_string(), args.clone());
        }
        if let Some(results) = &self.results {
            variables.insert(
                globals::RESULTS.to_string(),
                ScriptValue::Map(
                    results
                        .iter()
                        .map(|(key, value)| (key.clone(), ScriptValue::from(value.as_str())))
                        .collect(),
                ),
            );
        }
        variables
    }

    fn ensure_not_disposed(&self) -> Result<(), ScriptHostError> {
        if self.state == RuntimeState::Disposed {
            return Err(ScriptHostError::new(
                "RUNTIME_DISPOSED",
                format!("Runtime {} has been disposed.", self.exec_id),
            ));
        }
        Ok(())
    }
}
