//! Consoles and output streams kept alive by the host.
//!
//! The host owns an [`OutputRegistry`] and is the only strong owner of its
//! consoles. Streams refer to their console weakly and the registry refers
//! to streams weakly, so a stream lives exactly as long as the run holding
//! it, and a console the host released is gone even while old streams
//! remain. Once an entry is released its generation moves on, every handle
//! to it goes stale, and the next access builds a fresh instance.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::debug;

/// Generation-checked index into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputHandle {
    index: u32,
    generation: u32,
}

struct Slot<V> {
    generation: u32,
    value: Option<V>,
}

struct Arena<V> {
    slots: Vec<Slot<V>>,
    free: Vec<u32>,
}

impl<V> Default for Arena<V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<V: Clone> Arena<V> {
    fn insert(&mut self, value: V) -> OutputHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return OutputHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        OutputHandle {
            index,
            generation: 0,
        }
    }

    fn get(&self, handle: OutputHandle) -> Option<V> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.clone()
    }

    fn remove(&mut self, handle: OutputHandle) -> Option<V> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Some(value)
    }

    /// Frees every occupied slot whose value fails `keep`.
    fn retain(&mut self, keep: impl Fn(&V) -> bool) -> usize {
        let mut removed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.as_ref().is_some_and(|value| !keep(value)) {
                slot.value = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                removed += 1;
            }
        }
        removed
    }

    fn count(&self, live: impl Fn(&V) -> bool) -> usize {
        self.slots
            .iter()
            .filter_map(|slot| slot.value.as_ref())
            .filter(|value| live(value))
            .count()
    }
}

/// One line appended to a console, tagged with the run that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub exec_id: String,
    pub text: String,
}

/// Settings for a console the registry has to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSpec {
    pub output_id: String,
    pub title: String,
    pub app_version: String,
    pub debug_mode: bool,
}

/// Append-only output window shared by every run of the same command while
/// the host keeps it alive.
#[derive(Debug)]
pub struct ScriptConsole {
    instance_id: u64,
    spec: ConsoleSpec,
    lines: RefCell<Vec<ConsoleLine>>,
}

impl ScriptConsole {
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn output_id(&self) -> &str {
        &self.spec.output_id
    }

    pub fn title(&self) -> &str {
        &self.spec.title
    }

    pub fn app_version(&self) -> &str {
        &self.spec.app_version
    }

    pub fn debug_mode(&self) -> bool {
        self.spec.debug_mode
    }

    pub fn write_line(&self, exec_id: &str, text: &str) {
        self.lines.borrow_mut().push(ConsoleLine {
            exec_id: exec_id.to_string(),
            text: text.to_string(),
        });
    }

    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines.borrow().clone()
    }

    pub fn lines_for(&self, exec_id: &str) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|line| line.exec_id == exec_id)
            .map(|line| line.text.clone())
            .collect()
    }
}

/// Script output channel of one run, feeding a console. The run holding
/// the stream owns it; the console stays with the host.
#[derive(Debug)]
pub struct OutputStream {
    exec_id: String,
    console: Weak<ScriptConsole>,
}

impl OutputStream {
    pub fn exec_id(&self) -> &str {
        &self.exec_id
    }

    /// `None` once the host released the console.
    pub fn console(&self) -> Option<Rc<ScriptConsole>> {
        self.console.upgrade()
    }

    /// Appends `text` to the console, one entry per line. Dropped when the
    /// console was released.
    pub fn write(&self, text: &str) {
        let Some(console) = self.console.upgrade() else {
            debug!(
                target: "scripthost::output",
                exec_id = self.exec_id.as_str(),
                "console released; dropping output"
            );
            return;
        };
        for line in text.lines() {
            console.write_line(&self.exec_id, line);
        }
        if text.is_empty() {
            console.write_line(&self.exec_id, "");
        }
    }
}

/// Host-owned store of consoles and output streams.
#[derive(Default)]
pub struct OutputRegistry {
    consoles: Arena<Rc<ScriptConsole>>,
    streams: Arena<Weak<OutputStream>>,
    console_by_output_id: HashMap<String, OutputHandle>,
    next_instance_id: u64,
}

impl OutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn console(&self, handle: OutputHandle) -> Option<Rc<ScriptConsole>> {
        self.consoles.get(handle)
    }

    pub fn stream(&self, handle: OutputHandle) -> Option<Rc<OutputStream>> {
        self.streams.get(handle).and_then(|stream| stream.upgrade())
    }

    /// Live console registered for `output_id`, without creating one.
    pub fn find_console(&self, output_id: &str) -> Option<Rc<ScriptConsole>> {
        let handle = self.console_by_output_id.get(output_id).copied()?;
        self.consoles.get(handle)
    }

    /// Returns the live console registered for `spec.output_id`, or creates
    /// and registers a new one.
    pub fn console_for(&mut self, spec: ConsoleSpec) -> (OutputHandle, Rc<ScriptConsole>) {
        if let Some(handle) = self.console_by_output_id.get(&spec.output_id).copied() {
            if let Some(console) = self.consoles.get(handle) {
                return (handle, console);
            }
        }

        self.next_instance_id += 1;
        let output_id = spec.output_id.clone();
        let console = Rc::new(ScriptConsole {
            instance_id: self.next_instance_id,
            spec,
            lines: RefCell::new(Vec::new()),
        });
        let handle = self.consoles.insert(Rc::clone(&console));
        self.console_by_output_id.insert(output_id, handle);
        debug!(
            target: "scripthost::output",
            output_id = console.output_id(),
            instance_id = console.instance_id(),
            "created console"
        );
        (handle, console)
    }

    /// Creates a stream feeding `console`. The registry keeps only a weak
    /// entry; the caller owns the stream. Entries of dropped streams are
    /// reclaimed here.
    pub fn stream_for(
        &mut self,
        exec_id: &str,
        console: &Rc<ScriptConsole>,
    ) -> (OutputHandle, Rc<OutputStream>) {
        let reclaimed = self.streams.retain(|stream| stream.strong_count() > 0);
        if reclaimed > 0 {
            debug!(target: "scripthost::output", reclaimed, "reclaimed dropped streams");
        }
        let stream = Rc::new(OutputStream {
            exec_id: exec_id.to_string(),
            console: Rc::downgrade(console),
        });
        let handle = self.streams.insert(Rc::downgrade(&stream));
        (handle, stream)
    }

    /// Evicts a console along with the stream entries feeding it. Handles to
    /// either stop resolving.
    pub fn release_console(&mut self, handle: OutputHandle) -> bool {
        let Some(console) = self.consoles.remove(handle) else {
            return false;
        };
        if self.console_by_output_id.get(console.output_id()) == Some(&handle) {
            self.console_by_output_id.remove(console.output_id());
        }
        let evicted = Rc::downgrade(&console);
        self.streams.retain(|stream| {
            stream
                .upgrade()
                .is_some_and(|stream| !Weak::ptr_eq(&stream.console, &evicted))
        });
        debug!(
            target: "scripthost::output",
            output_id = console.output_id(),
            "released console"
        );
        true
    }

    pub fn release_output(&mut self, output_id: &str) -> bool {
        match self.console_by_output_id.get(output_id).copied() {
            Some(handle) => self.release_console(handle),
            None => false,
        }
    }

    pub fn release_stream(&mut self, handle: OutputHandle) -> bool {
        self.streams.remove(handle).is_some()
    }

    pub fn live_consoles(&self) -> usize {
        self.consoles.count(|_| true)
    }

    /// Streams still held by a run.
    pub fn live_streams(&self) -> usize {
        self.streams.count(|stream| stream.strong_count() > 0)
    }
}
