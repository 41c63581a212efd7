use std::path::PathBuf;

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

pub fn fixtures_root() -> PathBuf {
    workspace_root().join("fixtures")
}

pub fn script_path(name: &str) -> PathBuf {
    fixtures_root().join("scripts").join(name)
}

pub fn library_dir() -> PathBuf {
    fixtures_root().join("lib")
}

pub fn config_path(name: &str) -> PathBuf {
    fixtures_root().join("config").join(name)
}

pub fn bundle_dir(name: &str) -> PathBuf {
    fixtures_root().join("bundles").join(name)
}

pub fn cases_dir() -> PathBuf {
    fixtures_root().join("cases")
}

pub fn case_path(name: &str) -> PathBuf {
    cases_dir().join(format!("{}.case.json", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_root_points_to_workspace() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }

    #[test]
    fn fixture_directories_exist() {
        assert!(fixtures_root().is_dir());
        assert!(library_dir().is_dir());
        assert!(cases_dir().is_dir());
        assert!(bundle_dir("Report.invokebutton").is_dir());
    }

    #[test]
    fn named_paths_join_expected_files() {
        assert!(script_path("hello.rhai").is_file());
        assert!(config_path("executor.json").is_file());
        assert!(case_path("hello").ends_with("hello.case.json"));
        assert!(case_path("hello").is_file());
    }
}
