/// One compile-time diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    /// 1-based source line.
    pub line: usize,
}

impl Diagnostic {
    pub fn render(&self) -> String {
        format!("{} (line {})", self.message, self.line)
    }
}

/// Collects compile diagnostics in the order they are reported,
/// independently of the interpreter's own error type.
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    errors: Vec<Diagnostic>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Line 0 is read as line 1.
    pub fn report(&mut self, message: impl Into<String>, line: usize) {
        self.errors.push(Diagnostic {
            message: message.into(),
            line: line.max(1),
        });
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// All diagnostics, one per line, each ending with its line number.
    pub fn render(&self) -> String {
        self.errors
            .iter()
            .map(Diagnostic::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
