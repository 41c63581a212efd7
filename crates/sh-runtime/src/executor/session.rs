use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use rhai::module_resolvers::{FileModuleResolver, ModuleResolversCollection};
use rhai::{Engine, EvalAltResult, Position, Scope, AST, INT};
use tracing::{debug, info};

use super::traceback::exit_error;
use super::ExecutorOptions;
use crate::globals;
use crate::helpers::host_binding::register_host_type;
use crate::{ErrorReporter, OutputStream};

/// One freshly built interpreter. Dropping it releases the interpreter and
/// updates the owning executor's live count.
pub(crate) struct InterpreterSession {
    engine: Engine,
    live: Rc<Cell<usize>>,
}

impl InterpreterSession {
    pub(crate) fn open(
        options: &ExecutorOptions,
        live: &Rc<Cell<usize>>,
        resolution_paths: &[PathBuf],
        output: Option<Rc<OutputStream>>,
    ) -> Self {
        let mut engine = Engine::new();
        engine.set_strict_variables(options.strict_variables);
        engine.set_max_call_levels(options.max_call_levels);
        if options.max_operations > 0 {
            engine.set_max_operations(options.max_operations);
        }

        let mut resolvers = ModuleResolversCollection::new();
        for path in resolution_paths {
            resolvers.push(FileModuleResolver::new_with_path(path.clone()));
        }
        engine.set_module_resolver(resolvers);

        register_host_type(&mut engine);
        engine.register_fn(globals::EXIT_FN, || -> Result<(), Box<EvalAltResult>> {
            Err(exit_error(0))
        });
        engine.register_fn(
            globals::EXIT_FN,
            |code: INT| -> Result<(), Box<EvalAltResult>> { Err(exit_error(code)) },
        );

        match output {
            Some(stream) => {
                let print_stream = Rc::clone(&stream);
                engine.on_print(move |text| print_stream.write(text));
                engine.on_debug(move |text, _source, position| {
                    stream.write(&debug_line(text, position));
                });
            }
            None => {
                engine.on_print(|text| info!(target: "scripthost::script", "{}", text));
                engine.on_debug(|text, _source, position| {
                    debug!(target: "scripthost::script", "{}", debug_line(text, position));
                });
            }
        }

        live.set(live.get() + 1);
        debug!(target: "scripthost::executor", "interpreter created");
        Self {
            engine,
            live: Rc::clone(live),
        }
    }

    /// Compiles without running anything. Diagnostics land in `reporter`.
    pub(crate) fn compile(
        &self,
        scope: &Scope,
        source: &str,
        reporter: &mut ErrorReporter,
    ) -> Option<AST> {
        match self.engine.compile_with_scope(scope, source) {
            Ok(ast) => Some(ast),
            Err(error) => {
                reporter.report(
                    error.err_type().to_string(),
                    diagnostic_line(error.position(), source),
                );
                None
            }
        }
    }

    pub(crate) fn run(&self, scope: &mut Scope, ast: &AST) -> Result<(), Box<EvalAltResult>> {
        self.engine.run_ast_with_scope(scope, ast)
    }
}

impl Drop for InterpreterSession {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
        debug!(target: "scripthost::executor", "interpreter released");
    }
}

/// 1-based line of a compile error. Errors without a position are pinned
/// to the last line of the source.
pub(crate) fn diagnostic_line(position: Position, source: &str) -> usize {
    position
        .line()
        .unwrap_or_else(|| source.lines().count().max(1))
}

fn debug_line(text: &str, position: Position) -> String {
    match position.line() {
        Some(line) => format!("[debug line {}] {}", line, text),
        None => format!("[debug] {}", text),
    }
}
