use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

use sh_core::{EngineType, HostHandle, ScriptData, ScriptHostError};

use crate::executor::ExecutionOutcome;
use crate::OutputStream;

/// Everything a non-Rhai engine gets for one run.
pub struct EngineRequest {
    pub source_path: PathBuf,
    pub script: ScriptData,
    pub arguments: Vec<String>,
    pub exec_id: String,
    pub host: Option<HostHandle>,
    pub output: Option<Rc<OutputStream>>,
}

/// Host-provided implementation of one of the engine variants the runtime
/// does not run itself.
pub trait EngineHandler {
    fn engine_type(&self) -> EngineType;
    fn execute(&self, request: &EngineRequest) -> ExecutionOutcome;
}

#[derive(Default)]
pub struct EngineRegistry {
    handlers: BTreeMap<EngineType, Rc<dyn EngineHandler>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for its engine type, replacing any earlier one.
    /// `Script` is always run by the built-in executor and `Unknown` is
    /// always skipped, so neither can be taken over.
    pub fn register(&mut self, handler: Rc<dyn EngineHandler>) -> Result<(), ScriptHostError> {
        let engine_type = handler.engine_type();
        if matches!(engine_type, EngineType::Script | EngineType::Unknown) {
            return Err(ScriptHostError::new(
                "ENGINE_RESERVED",
                format!("Engine type \"{}\" cannot be registered.", engine_type),
            ));
        }
        self.handlers.insert(engine_type, handler);
        Ok(())
    }

    pub fn get(&self, engine_type: EngineType) -> Option<Rc<dyn EngineHandler>> {
        self.handlers.get(&engine_type).cloned()
    }

    pub fn registered(&self) -> Vec<EngineType> {
        self.handlers.keys().copied().collect()
    }
}
