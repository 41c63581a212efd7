pub(crate) mod host_binding;
pub(crate) mod rhai_bridge;
