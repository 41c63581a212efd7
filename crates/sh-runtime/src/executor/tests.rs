use super::*;
use crate::{ConsoleSpec, OutputRegistry};
use sh_core::StaticHost;

use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be monotonic")
        .as_nanos();
    std::env::temp_dir().join(format!("scripthost-executor-{}-{}", name, nanos))
}

fn write_script(dir: &Path, name: &str, content: &str) -> PathBuf {
    fs::create_dir_all(dir).expect("script dir should be created");
    let path = dir.join(name);
    fs::write(&path, content).expect("script should be written");
    path
}

fn run(executor: &ScriptExecutor, path: &Path) -> ExecutionOutcome {
    executor.execute(path, &[], None, &BTreeMap::new())
}

fn stream(registry: &mut OutputRegistry) -> Rc<OutputStream> {
    let (_, console) = registry.console_for(ConsoleSpec {
        output_id: "cmd-test".to_string(),
        title: "test".to_string(),
        app_version: "1:2:3".to_string(),
        debug_mode: false,
    });
    registry.stream_for("exec-1", &console).1
}

#[test]
fn exit_before_error_counts_as_success() {
    let dir = temp_path("exit");
    let path = write_script(
        &dir,
        "main.rhai",
        "__message__ = \"stopped early\";\nexit();\nthrow \"unreachable\";\n",
    );
    let executor = ScriptExecutor::default();

    let outcome = run(&executor, &path);
    assert_eq!(outcome.result, ExecutionResult::Succeeded);
    assert_eq!(outcome.message, "stopped early");
    assert_eq!(outcome.exit_code, Some(0));
    assert_eq!(executor.live_interpreters(), 0);
}

#[test]
fn exit_inside_function_carries_its_code() {
    let dir = temp_path("exit-fn");
    let path = write_script(
        &dir,
        "main.rhai",
        "fn stop() { exit(2); }\nstop();\nthrow \"unreachable\";\n",
    );
    let outcome = run(&ScriptExecutor::default(), &path);
    assert_eq!(outcome.result, ExecutionResult::Succeeded);
    assert_eq!(outcome.exit_code, Some(2));
}

#[test]
fn exit_inside_try_is_not_caught() {
    let dir = temp_path("exit-try");
    let path = write_script(
        &dir,
        "main.rhai",
        concat!(
            "try { exit(); } catch (e) { __message__ = \"caught exit\"; }\n",
            "let zero = 0;\n",
            "let x = 1 / zero;\n",
        ),
    );
    let executor = ScriptExecutor::default();

    let outcome = run(&executor, &path);
    assert_eq!(outcome.result, ExecutionResult::Succeeded, "{}", outcome.message);
    assert_eq!(outcome.exit_code, Some(0));
    assert!(outcome.message.is_empty());
    assert_eq!(executor.live_interpreters(), 0);
}

#[test]
fn syntax_error_cancels_without_running_any_statement() {
    let dir = temp_path("syntax");
    let path = write_script(&dir, "main.rhai", "print(\"before\");\nlet b = (2 + ;\n");
    let log_path = dir.join("logs").join("run.log");
    let mut registry = OutputRegistry::new();
    let output = stream(&mut registry);
    let executor = ScriptExecutor::default().with_output(Some(Rc::clone(&output)));

    let outcome = executor.execute(&path, &[], Some(&log_path), &BTreeMap::new());
    assert_eq!(outcome.result, ExecutionResult::Cancelled);
    assert!(outcome.message.starts_with(SCRIPT_TRACEBACK_HEADER));
    assert!(outcome.message.contains("(line 2)"));
    assert!(output.console().expect("console").lines().is_empty());
    assert_eq!(outcome.log_file.as_deref(), Some(log_path.as_path()));
    assert_eq!(
        fs::read_to_string(&log_path).expect("log should be written"),
        outcome.message
    );
    assert_eq!(executor.live_interpreters(), 0);
}

#[test]
fn runtime_error_fails_with_both_tracebacks() {
    let dir = temp_path("runtime");
    let path = write_script(&dir, "main.rhai", "let x = 1;\nthrow \"boom\";\n");
    let log_path = dir.join("error.log");
    fs::write(&log_path, "stale content").expect("stale log should be written");
    let executor = ScriptExecutor::default();

    let outcome = executor.execute(&path, &[], Some(&log_path), &BTreeMap::new());
    assert_eq!(outcome.result, ExecutionResult::Failed);
    let (script_section, executor_section) = outcome
        .message
        .split_once("\n\n")
        .expect("message should have two sections");
    assert!(script_section.starts_with(SCRIPT_TRACEBACK_HEADER));
    assert!(script_section.contains("boom"));
    assert!(executor_section.starts_with(EXECUTOR_TRACEBACK_HEADER));
    assert_eq!(outcome.log_file.as_deref(), Some(log_path.as_path()));
    assert_eq!(
        fs::read_to_string(&log_path).expect("log should be overwritten"),
        outcome.message
    );
    assert_eq!(executor.live_interpreters(), 0);
}

#[test]
fn successful_run_leaves_log_untouched() {
    let dir = temp_path("no-log");
    let path = write_script(&dir, "main.rhai", "let x = 40 + 2;\n");
    let log_path = dir.join("ok.log");

    let outcome = ScriptExecutor::default().execute(&path, &[], Some(&log_path), &BTreeMap::new());
    assert_eq!(outcome.result, ExecutionResult::Succeeded);
    assert!(outcome.message.is_empty());
    assert!(outcome.log_file.is_none());
    assert!(!log_path.exists());
}

#[test]
fn unwritable_log_path_is_not_reported() {
    let dir = temp_path("blocked-log");
    let path = write_script(&dir, "main.rhai", "throw \"bad\";\n");
    let blocker = dir.join("blocker");
    fs::write(&blocker, "file, not a directory").expect("blocker should be written");

    let outcome = ScriptExecutor::default().execute(
        &path,
        &[],
        Some(&blocker.join("run.log")),
        &BTreeMap::new(),
    );
    assert_eq!(outcome.result, ExecutionResult::Failed);
    assert!(outcome.log_file.is_none());
}

#[test]
fn missing_source_fails_without_interpreter() {
    let executor = ScriptExecutor::default();
    let outcome = run(&executor, &temp_path("missing").join("nope.rhai"));
    assert_eq!(outcome.result, ExecutionResult::Failed);
    assert!(!outcome.message.is_empty());
    assert_eq!(executor.live_interpreters(), 0);
}

#[test]
fn command_slots_are_read_back() {
    let dir = temp_path("slots");
    let path = write_script(
        &dir,
        "main.rhai",
        "__message__ = __vars__.greeting + \" there\";\n__results__.count = 3;\n__results__[\"name\"] = \"x\";\n",
    );
    let variables = BTreeMap::from([(
        globals::VARS.to_string(),
        ScriptValue::from(BTreeMap::from([(
            "greeting".to_string(),
            "hi".to_string(),
        )])),
    )]);

    let outcome = ScriptExecutor::default().execute(&path, &[], None, &variables);
    assert_eq!(outcome.result, ExecutionResult::Succeeded);
    assert_eq!(outcome.message, "hi there");
    assert_eq!(outcome.results.get("count").map(String::as_str), Some("3"));
    assert_eq!(outcome.results.get("name").map(String::as_str), Some("x"));
    assert_eq!(outcome.exit_code, None);
}

#[test]
fn result_slot_selects_outcome() {
    let dir = temp_path("result-slot");
    let cancelled = write_script(&dir, "cancel.rhai", "__result__ = 1;\n");
    let failed = write_script(&dir, "fail.rhai", "__result__ = \"failed\";\n");
    let executor = ScriptExecutor::default();

    assert_eq!(run(&executor, &cancelled).result, ExecutionResult::Cancelled);
    assert_eq!(run(&executor, &failed).result, ExecutionResult::Failed);
}

#[test]
fn search_paths_resolve_imports_after_script_directory() {
    let root = temp_path("imports");
    let library = root.join("lib");
    write_script(&library, "helpers.rhai", "fn double(x) { x * 2 }\n");
    write_script(&root.join("app"), "local.rhai", "fn label() { \"local\" }\n");
    let path = write_script(
        &root.join("app"),
        "main.rhai",
        "import \"helpers\" as h;\nimport \"local\" as l;\n__message__ = `${l::label()}:${h::double(21)}`;\n",
    );

    let outcome = ScriptExecutor::default().execute(&path, &[library], None, &BTreeMap::new());
    assert_eq!(outcome.result, ExecutionResult::Succeeded, "{}", outcome.message);
    assert_eq!(outcome.message, "local:42");
}

#[test]
fn entry_unit_runs_as_main() {
    let dir = temp_path("main-name");
    let path = write_script(
        &dir,
        "main.rhai",
        "if __name__ == \"__main__\" { __message__ = __file__; }\n",
    );
    let outcome = run(&ScriptExecutor::default(), &path);
    assert_eq!(outcome.message, path.display().to_string());
}

#[test]
fn caller_variables_override_defaults_but_not_host() {
    let dir = temp_path("override");
    let path = write_script(
        &dir,
        "main.rhai",
        "__message__ = __file__ + \"|\" + __host__.name;\n",
    );
    let host = StaticHost::new("Studio", "2024").into_ref();
    let variables = BTreeMap::from([
        (globals::FILE.to_string(), ScriptValue::from("custom.rhai")),
        (globals::HOST.to_string(), ScriptValue::from("spoofed")),
    ]);
    let executor = ScriptExecutor::default().with_host(Some(HostHandle::Application(host)));

    let outcome = executor.execute(&path, &[], None, &variables);
    assert_eq!(outcome.message, "custom.rhai|Studio");
}

#[test]
fn print_and_debug_reach_the_output_stream() {
    let dir = temp_path("print");
    let path = write_script(&dir, "main.rhai", "print(\"hello\");\ndebug(\"details\");\n");
    let mut registry = OutputRegistry::new();
    let output = stream(&mut registry);
    let executor = ScriptExecutor::default().with_output(Some(Rc::clone(&output)));

    assert_eq!(run(&executor, &path).result, ExecutionResult::Succeeded);
    let lines = output.console().expect("console").lines_for("exec-1");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "hello");
    assert!(lines[1].contains("details"));
}

#[test]
fn interpreter_limits_come_from_options() {
    let dir = temp_path("limits");
    let undefined = write_script(&dir, "undefined.rhai", "__message__ = not_defined;\n");
    let endless = write_script(&dir, "endless.rhai", "loop { }\n");
    let executor = ScriptExecutor::new(ExecutorOptions {
        strict_variables: true,
        max_operations: 1_000,
        max_call_levels: 16,
    });

    assert_eq!(run(&executor, &undefined).result, ExecutionResult::Cancelled);
    assert_eq!(run(&executor, &endless).result, ExecutionResult::Failed);
    assert_eq!(executor.live_interpreters(), 0);
}

#[test]
fn compile_only_reports_without_running() {
    let dir = temp_path("compile-only");
    let good = write_script(&dir, "good.rhai", "throw \"never runs\";\n");
    let bad = write_script(&dir, "bad.rhai", "let = ;\n");
    let executor = ScriptExecutor::default();

    assert!(executor.compile_only(&good).expect("readable").is_empty());
    assert!(!executor.compile_only(&bad).expect("readable").is_empty());
    let error = executor
        .compile_only(&dir.join("absent.rhai"))
        .expect_err("missing source should fail");
    assert_eq!(error.code, "EXECUTOR_SOURCE_READ");
    assert_eq!(executor.live_interpreters(), 0);
}
