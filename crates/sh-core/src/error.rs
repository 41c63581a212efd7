use thiserror::Error;

/// Error raised for host-side misuse of the runtime (bad config, reusing a
/// disposed runtime). Script failures are reported through
/// [`crate::ExecutionResult`] instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ScriptHostError {
    pub code: String,
    pub message: String,
}

impl ScriptHostError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn display_includes_code_and_message() {
        let error = ScriptHostError::new("RUNTIME_DISPOSED", "Runtime was disposed.");
        assert_eq!(error.to_string(), "RUNTIME_DISPOSED: Runtime was disposed.");
    }
}
