use super::{
    follow_log, run_codegen, run_commands, run_fixtures, run_list, run_markup, run_prepare,
    run_status, run_vars, RunnerError,
};
use crate::catalog::{parse_catalog, CatalogError};
use crate::cli::{
    CodegenArgs, CommandsArgs, FixturesArgs, ListArgs, MarkupArgs, StatusArgs, VarsArgs,
};
use crate::ui::PlainRenderer;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

const LIST_OUTPUT: &str = concat!(
    "Listing tests:\n",
    "  [setup] › auth.setup.ts:3:1 › login\n",
    "  [chromium] › tests/cart.spec.ts:5:1 › adds item\n",
    "  [chromium] › tests/cart.spec.ts:9:1 › removes item\n",
    "Total: 3 tests in 2 files\n",
);

const RUN_LOG: &str = concat!(
    "Running 3 tests using 1 worker\n",
    "  ✓  1 [setup] › auth.setup.ts:3:1 › login (1.1s)\n",
    "  ✘  2 [chromium] › tests/cart.spec.ts:5:1 › adds item (2.0s)\n",
    "\n",
    "  1) [chromium] › tests/cart.spec.ts:5:1 › adds item\n",
    "    Error: expect(received).toBe(expected)\n",
);

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("tasks.sh"), "#!/bin/sh\n").expect("write tasks.sh");
    dir
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write file");
    path
}

fn repo(dir: &tempfile::TempDir) -> Option<PathBuf> {
    Some(dir.path().to_path_buf())
}

#[test]
fn follow_prints_results_as_lines_complete() {
    let mut renderer = PlainRenderer::new(Vec::<u8>::new(), false);
    let counts =
        follow_log(Cursor::new(RUN_LOG), &mut renderer, "/work/app", None).expect("follow");

    let output = String::from_utf8(renderer.into_inner()).expect("utf8");
    assert_eq!(
        output,
        "✓ /auth.setup.ts › login [setup]\n\
         ✘ /tests/cart.spec.ts › adds item [chromium]\n\
         \n\
         summary  passed:1  failed:1  idle:0\n"
    );
    assert_eq!((counts.passed, counts.failed, counts.idle), (1, 1, 0));
}

#[test]
fn follow_with_catalog_marks_unreached_tests_skipped() {
    let catalog = parse_catalog(LIST_OUTPUT, "/work/app").expect("catalog");
    let mut renderer = PlainRenderer::new(Vec::<u8>::new(), false);
    let counts = follow_log(
        Cursor::new(RUN_LOG),
        &mut renderer,
        "/work/app",
        Some(&catalog),
    )
    .expect("follow");

    let output = String::from_utf8(renderer.into_inner()).expect("utf8");
    assert!(output.contains("Run Selection\n"));
    assert!(output.contains("✓ /auth.setup.ts › login\n"));
    assert!(output.contains("✘ /tests/cart.spec.ts › adds item\n"));
    assert!(output.contains("- /tests/cart.spec.ts › removes item\n"));
    assert_eq!((counts.passed, counts.failed, counts.idle), (1, 1, 1));
}

#[test]
fn follow_handles_log_without_trailing_newline() {
    let mut renderer = PlainRenderer::new(Vec::<u8>::new(), false);
    let counts = follow_log(
        Cursor::new("  ✓  1 [chromium] › a.spec.ts:1:1 › opens"),
        &mut renderer,
        "/r",
        None,
    )
    .expect("follow");
    assert_eq!(counts.passed, 1);
}

#[test]
fn status_json_lists_records_and_latest_per_case() {
    let dir = project();
    let log = write(
        dir.path(),
        "run.log",
        "  ✘  1 [chromium] › a.spec.ts:1:1 › opens\n  ✓  2 [chromium] › a.spec.ts:1:1 › opens\n",
    );
    let output = run_status(
        repo(&dir),
        StatusArgs {
            input: log,
            catalog: None,
            json: true,
        },
    )
    .expect("status");

    let value: serde_json::Value = serde_json::from_str(&output).expect("json");
    assert_eq!(value["records"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["latest"][0]["path"], "/a.spec.ts");
    assert_eq!(value["latest"][0]["title"], "opens");
    assert_eq!(value["latest"][0]["status"], "pass");
    assert!(value.get("selection").is_none());
}

#[test]
fn status_with_catalog_reports_display_states() {
    let dir = project();
    let log = write(dir.path(), "run.log", RUN_LOG);
    let catalog = write(dir.path(), "list.txt", LIST_OUTPUT);
    let output = run_status(
        repo(&dir),
        StatusArgs {
            input: log,
            catalog: Some(catalog),
            json: true,
        },
    )
    .expect("status");

    let value: serde_json::Value = serde_json::from_str(&output).expect("json");
    let displays = value["selection"]
        .as_array()
        .expect("selection")
        .iter()
        .map(|row| row["display"].as_str().unwrap_or_default().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(displays, vec!["passed", "failed", "skipped"]);
}

#[test]
fn list_from_captured_output_renders_table() {
    let dir = project();
    let captured = write(dir.path(), "list.txt", LIST_OUTPUT);
    let output = run_list(
        repo(&dir),
        ListArgs {
            grep: None,
            from: Some(captured),
            json: false,
        },
    )
    .expect("list");

    assert!(output.contains("Test Catalog"));
    assert!(output.contains("/tests/cart.spec.ts"));
    assert!(output.contains("removes item"));
    assert!(output.contains("auth"));
}

#[test]
fn list_json_reports_empty_match_message() {
    let dir = project();
    let captured = write(dir.path(), "list.txt", "Listing tests:\nTotal: 0 tests in 0 files\n");
    let output = run_list(
        repo(&dir),
        ListArgs {
            grep: Some("checkout".to_owned()),
            from: Some(captured),
            json: true,
        },
    )
    .expect("list");

    let value: serde_json::Value = serde_json::from_str(&output).expect("json");
    assert_eq!(value["message"], "No tests matched current grep \"checkout\"");
    assert_eq!(value["tests"].as_array().map(Vec::len), Some(0));
}

#[test]
fn list_without_header_surfaces_raw_output() {
    let dir = project();
    let captured = write(dir.path(), "list.txt", "Error: playwright.config.ts not found\n");
    let err = run_list(
        repo(&dir),
        ListArgs {
            grep: None,
            from: Some(captured),
            json: false,
        },
    )
    .expect_err("shape error");

    assert!(matches!(
        err,
        RunnerError::Catalog(CatalogError::UnexpectedFormat { .. })
    ));
    assert_eq!(
        err.diagnostic(),
        Some("Error: playwright.config.ts not found\n")
    );
    let block = err.into_message_block();
    assert_eq!(block.title, "Test listing failed");
    assert!(block.detail.is_some());
}

#[test]
fn markup_reads_file() {
    let dir = project();
    let raw = write(dir.path(), "raw.txt", "\u{1b}[32mok\u{1b}[0m <b>");
    let output = run_markup(MarkupArgs { input: raw }).expect("markup");
    assert_eq!(
        output,
        "<span></span><span class=\"color-green\">ok</span><span> &lt;b&gt;</span>"
    );
}

#[test]
fn missing_input_file_is_reported() {
    let err = run_markup(MarkupArgs {
        input: PathBuf::from("/definitely/missing/raw.txt"),
    })
    .expect_err("missing");
    assert!(err.to_string().starts_with("failed to read /definitely/missing/raw.txt"));
}

#[test]
fn fixtures_json_uses_configured_session_dir() {
    let dir = project();
    fs::write(
        dir.path().join("playdeck.toml"),
        "[session]\ndir = \"storage\"\nartifact = \"state.json\"\n",
    )
    .expect("config");
    let fixture = dir.path().join("storage/admin");
    fs::create_dir_all(&fixture).expect("mkdir");
    fs::write(fixture.join("state.json"), "{}").expect("artifact");

    let output = run_fixtures(repo(&dir), FixturesArgs { json: true }).expect("fixtures");
    let value: serde_json::Value = serde_json::from_str(&output).expect("json");
    assert_eq!(value["fixtures"][0]["display_name"], "admin");
    assert_eq!(value["fixtures"][0]["relative_path"], "storage/admin");
}

#[test]
fn fixtures_fail_when_session_dir_is_missing() {
    let dir = project();
    let err = run_fixtures(repo(&dir), FixturesArgs { json: false }).expect_err("missing");
    assert!(matches!(err, RunnerError::Fixtures(_)));
}

#[test]
fn codegen_prints_recording_command() {
    let dir = project();
    let output = run_codegen(
        repo(&dir),
        CodegenArgs {
            output_dir: Some(PathBuf::from("session/admin")),
            output_file: None,
            url: "https://example.test".to_owned(),
            load: None,
            no_save: false,
        },
    )
    .expect("codegen");
    assert_eq!(
        output,
        "PLAYWRIGHT_FORCE_TTY=0 FORCE_COLOR=0 ./tasks.sh codegen \
         --output=session/admin/setup.ts --save-storage=session/admin/auth.json \
         https://example.test"
    );
}

#[test]
fn commands_use_configured_filter() {
    let dir = project();
    fs::write(dir.path().join("playdeck.toml"), "[tests]\ngrep = \"smoke\"\n").expect("config");
    let output = run_commands(repo(&dir), CommandsArgs { grep: None }).expect("commands");
    assert!(output.contains("./tasks.sh test --reporter=list --list --grep=/smoke/"));
    assert!(output.contains("./tasks.sh report"));
    assert!(output.contains("prepare: ./tasks.sh prepare"));
}

#[cfg(unix)]
#[test]
fn prepare_prints_task_output() {
    let dir = project();
    fs::write(
        dir.path().join("playdeck.toml"),
        "[tests]\nprepare_command = \"sh ./prepare.sh\"\n",
    )
    .expect("config");
    write(dir.path(), "prepare.sh", "echo 'installed 3 packages'\necho 'browsers ready'\n");

    let output = run_prepare(repo(&dir)).expect("prepare");
    assert!(output.contains("command: sh ./prepare.sh"));
    assert!(output.ends_with("installed 3 packages\nbrowsers ready"));
}

#[cfg(unix)]
#[test]
fn prepare_failure_carries_the_diagnostic() {
    let dir = project();
    fs::write(
        dir.path().join("playdeck.toml"),
        "[tests]\nprepare_command = \"sh ./prepare.sh\"\n",
    )
    .expect("config");
    write(dir.path(), "prepare.sh", "echo 'lockfile out of date' >&2\n");

    let err = run_prepare(repo(&dir)).expect_err("diagnostic");
    assert!(matches!(err, RunnerError::Prepare(_)));
    let block = err.into_message_block();
    assert_eq!(block.title, "Project prepare failed");
    assert_eq!(block.detail.as_deref(), Some("lockfile out of date"));
}

#[test]
fn vars_lists_declared_names_and_checks_a_candidate() {
    let dir = project();
    write(dir.path(), "env.config", "BASE_URL=https://staging.test\nAPI_KEY=secret\n");

    let output = run_vars(
        repo(&dir),
        VarsArgs {
            name: Some("api key".to_owned()),
            json: false,
        },
    )
    .expect("vars");
    assert!(output.contains("variables: 2"));
    assert!(output.contains("BASE_URL"));
    assert!(output.contains("stored as: API_KEY"));
    assert!(output.contains("API_KEY is already declared"));
}

#[test]
fn vars_json_without_env_config_is_empty() {
    let dir = project();
    let output = run_vars(
        repo(&dir),
        VarsArgs {
            name: Some("region".to_owned()),
            json: true,
        },
    )
    .expect("vars");
    let value: serde_json::Value = serde_json::from_str(&output).expect("json");
    assert_eq!(value["names"].as_array().map(Vec::len), Some(0));
    assert_eq!(value["check"]["normalized"], "REGION");
    assert_eq!(value["check"]["declared"], false);
}
