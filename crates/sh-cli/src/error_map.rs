use sh_core::ScriptHostError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> ScriptHostError {
    ScriptHostError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: ScriptHostError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!("ERROR_MSG_JSON:{}", json_string(&error.message));
    1
}

pub(crate) fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

pub(crate) fn map_cli_path(error: std::io::Error) -> ScriptHostError {
    map_error("CLI_PATH", error)
}

pub(crate) fn map_cli_trace_file(error: std::io::Error) -> ScriptHostError {
    map_error("CLI_TRACE_FILE", error)
}

pub(crate) fn map_cli_cases(error: sh_tool::ShToolError) -> ScriptHostError {
    map_error("CLI_CASES", error)
}

pub(crate) fn map_cli_json(error: serde_json::Error) -> ScriptHostError {
    map_error("CLI_JSON", error)
}
