mod context;
mod engines;
mod executor;
pub mod globals;
mod helpers;
mod output;
mod reporter;
mod runtime;
mod selector;

pub use context::{ExecutionContext, SenderPolicy};
pub use engines::{EngineHandler, EngineRegistry, EngineRequest};
pub use executor::{
    ExecutionOutcome, ExecutorOptions, ScriptExecutor, EXECUTOR_TRACEBACK_HEADER,
    SCRIPT_TRACEBACK_HEADER,
};
pub use output::{
    ConsoleLine, ConsoleSpec, OutputHandle, OutputRegistry, OutputStream, ScriptConsole,
};
pub use reporter::{Diagnostic, ErrorReporter};
pub use runtime::{RuntimeState, ScriptRuntime};
pub use selector::{select_engine, select_engine_with};

use sh_core::EnvironmentSnapshot;

/// Version tag of the embedded interpreter, reported as the engine version
/// of `Script` runs.
pub const INTERPRETER_VERSION: &str = "rhai-1.23";

/// Snapshot of the process environment with the interpreter version filled
/// in when the environment does not override it.
pub fn capture_environment() -> EnvironmentSnapshot {
    EnvironmentSnapshot::capture().with_engine_version(INTERPRETER_VERSION)
}
