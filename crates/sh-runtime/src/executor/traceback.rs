use std::path::Path;

use rhai::{Dynamic, EvalAltResult, Position, INT};

use crate::ErrorReporter;

pub const SCRIPT_TRACEBACK_HEADER: &str = "Script Traceback:";
pub const EXECUTOR_TRACEBACK_HEADER: &str = "Executor Traceback:";

/// Payload carried by the error `exit()` raises. It travels as a
/// termination, which `try`/`catch` in scripts cannot intercept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExitSignal(pub(crate) INT);

pub(crate) fn exit_error(code: INT) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorTerminated(
        Dynamic::from(ExitSignal(code)),
        Position::NONE,
    ))
}

/// Exit code of a controlled exit, looking through function-call and
/// module wrappers.
pub(crate) fn exit_code(error: &EvalAltResult) -> Option<INT> {
    match error {
        EvalAltResult::ErrorTerminated(value, _) => {
            value.clone().try_cast::<ExitSignal>().map(|signal| signal.0)
        }
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => exit_code(inner),
        EvalAltResult::ErrorInModule(_, inner, _) => exit_code(inner),
        _ => None,
    }
}

pub(crate) fn compile_failure_message(reporter: &ErrorReporter) -> String {
    format!("{}\n{}", SCRIPT_TRACEBACK_HEADER, reporter.render())
}

/// Two independent sections: the interpreter's own rendering of the error,
/// then the host-side detail.
pub(crate) fn runtime_failure_message(source_path: &Path, error: &EvalAltResult) -> String {
    let script_section = format!("{}\n{}", SCRIPT_TRACEBACK_HEADER, error);
    let executor_section = format!(
        "{}\n{}: {:?}",
        EXECUTOR_TRACEBACK_HEADER,
        source_path.display(),
        error
    );
    format!("{}\n\n{}", script_section, executor_section)
}
