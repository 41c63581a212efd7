use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

fn sh_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sh-cli"))
        .args(args)
        .output()
        .expect("cli should execute")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn run_prints_protocol_lines_for_hello_fixture() {
    let script = fixtures_root().join("scripts").join("hello.rhai");
    let output = sh_cli(&["run", "--script", &path_arg(&script)]);
    let lines = stdout_lines(&output);

    assert_eq!(output.status.code(), Some(0), "stdout: {:?}", lines);
    assert_eq!(lines[0], "RESULT:SUCCEEDED");
    assert_eq!(lines[1], "ENGINE:script");
    assert!(lines[2].starts_with("EXEC_ID:"));
    assert!(lines.contains(&"OUTPUT:hello from sh-cli".to_string()));
    assert!(lines.contains(&"MESSAGE_JSON:\"greeted sh-cli\"".to_string()));
    assert!(lines.contains(&"LOG_FILE:NONE".to_string()));
}

#[test]
fn run_uses_config_search_paths_and_variables() {
    let root = fixtures_root();
    let script = root.join("scripts").join("uses_library.rhai");
    let config = root.join("config").join("executor.json");
    let output = sh_cli(&[
        "run",
        "--script",
        &path_arg(&script),
        "--config",
        &path_arg(&config),
    ]);
    let lines = stdout_lines(&output);

    assert_eq!(output.status.code(), Some(0), "stdout: {:?}", lines);
    assert!(lines.contains(&"OUTPUT:== tower ==".to_string()));
    assert!(lines.contains(&"RESULTS_JSON:{\"upper\":\"TOWER\"}".to_string()));
}

#[test]
fn run_exit_codes_match_outcomes() {
    let scripts = fixtures_root().join("scripts");
    let cases = [
        ("early_exit.rhai", 0, "RESULT:SUCCEEDED"),
        ("runtime_error.rhai", 1, "RESULT:FAILED"),
        ("unbalanced.rhai", 2, "RESULT:CANCELLED"),
    ];
    for (name, code, first_line) in cases {
        let script = scripts.join(name);
        let output = sh_cli(&["run", "--script", &path_arg(&script)]);
        let lines = stdout_lines(&output);
        assert_eq!(output.status.code(), Some(code), "{}: {:?}", name, lines);
        assert_eq!(lines[0], first_line, "{}", name);
    }
}

#[test]
fn log_file_line_names_only_a_written_log() {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be monotonic")
        .as_nanos();
    let log = std::env::temp_dir()
        .join(format!("scripthost-smoke-log-{}", nanos))
        .join("run.log");
    let scripts = fixtures_root().join("scripts");

    let clean = sh_cli(&[
        "run",
        "--script",
        &path_arg(&scripts.join("hello.rhai")),
        "--log-file",
        &path_arg(&log),
    ]);
    let lines = stdout_lines(&clean);
    assert_eq!(clean.status.code(), Some(0), "stdout: {:?}", lines);
    assert!(lines.contains(&"LOG_FILE:NONE".to_string()));
    assert!(!log.exists());

    let failed = sh_cli(&[
        "run",
        "--script",
        &path_arg(&scripts.join("runtime_error.rhai")),
        "--log-file",
        &path_arg(&log),
    ]);
    let lines = stdout_lines(&failed);
    assert_eq!(failed.status.code(), Some(1), "stdout: {:?}", lines);
    assert!(lines.contains(&format!("LOG_FILE:{}", path_arg(&log))));
    assert!(log.exists());
}

#[test]
fn test_subcommand_passes_all_fixture_cases() {
    let cases = fixtures_root().join("cases");
    let output = sh_cli(&["test", "--cases-dir", &path_arg(&cases)]);
    let lines = stdout_lines(&output);

    assert_eq!(output.status.code(), Some(0), "stdout: {:?}", lines);
    assert!(lines.contains(&"FAILED:0".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some("RESULT:OK"));
}

#[test]
fn verbose_logging_stays_off_stdout() {
    let script = fixtures_root().join("scripts").join("hello.rhai");
    let output = sh_cli(&["-vv", "run", "--script", &path_arg(&script)]);
    let lines = stdout_lines(&output);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(lines[0], "RESULT:SUCCEEDED");
    assert!(!output.stderr.is_empty());
}
