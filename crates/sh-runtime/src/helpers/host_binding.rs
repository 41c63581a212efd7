use rhai::Engine;
use sh_core::{HostHandle, HostRef};

/// Script-side view of a host application handle.
#[derive(Clone)]
pub(crate) struct HostBinding {
    handle: HostHandle,
}

impl HostBinding {
    pub(crate) fn new(handle: HostHandle) -> Self {
        Self { handle }
    }

    pub(crate) fn startup(host: HostRef) -> Self {
        Self::new(HostHandle::UiControlledApplication(host))
    }

    fn document_title(&self) -> String {
        self.handle
            .host()
            .active_document()
            .map(|document| document.title)
            .unwrap_or_default()
    }

    fn document_path(&self) -> String {
        self.handle
            .host()
            .active_document()
            .map(|document| document.path)
            .unwrap_or_default()
    }

    fn describe(&self) -> String {
        format!(
            "{} {} ({})",
            self.handle.host().name(),
            self.handle.host().version(),
            self.handle.kind().as_str()
        )
    }
}

pub(crate) fn register_host_type(engine: &mut Engine) {
    engine
        .register_type_with_name::<HostBinding>("HostApplication")
        .register_get("name", |binding: &mut HostBinding| {
            binding.handle.host().name()
        })
        .register_get("version", |binding: &mut HostBinding| {
            binding.handle.host().version()
        })
        .register_get("kind", |binding: &mut HostBinding| {
            binding.handle.kind().as_str().to_string()
        })
        .register_get("document_title", |binding: &mut HostBinding| {
            binding.document_title()
        })
        .register_get("document_path", |binding: &mut HostBinding| {
            binding.document_path()
        })
        .register_fn("has_document", |binding: &mut HostBinding| {
            binding.handle.host().active_document().is_some()
        })
        .register_fn("to_string", |binding: &mut HostBinding| binding.describe())
        .register_fn("to_debug", |binding: &mut HostBinding| binding.describe());
}
