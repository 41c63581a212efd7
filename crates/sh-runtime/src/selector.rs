use std::path::Path;

use sh_core::{BundleKind, EngineType, ScriptKind};

/// Picks the engine for a script from its path and owning bundle. A script
/// of the interpreted kind that no longer exists on disk falls through to
/// the bundle rules, which yields `Unknown` for anything but invoke bundles.
pub fn select_engine(script_path: &Path, bundle: Option<&Path>) -> EngineType {
    select_engine_with(script_path, bundle, Path::is_file)
}

pub fn select_engine_with(
    script_path: &Path,
    bundle: Option<&Path>,
    exists: impl Fn(&Path) -> bool,
) -> EngineType {
    match ScriptKind::of(script_path) {
        Some(ScriptKind::Script) if exists(script_path) => return EngineType::Script,
        Some(ScriptKind::Script) | None => {}
        Some(ScriptKind::Compiled) => return EngineType::Compiled,
        Some(ScriptKind::Visual) => return EngineType::Visual,
    }

    match bundle {
        Some(bundle) if BundleKind::of(bundle) == BundleKind::InvokeButton => EngineType::Invoke,
        _ => EngineType::Unknown,
    }
}
