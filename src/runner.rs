use std::fs;
use std::io::{BufRead, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{
    load_catalog, parse_catalog, CatalogError, CatalogOutcome, ListSource, TestDescriptor,
};
use crate::cli::{
    is_stdin, Cli, CodegenArgs, Command, CommandsArgs, FixturesArgs, FollowArgs, ListArgs,
    MarkupArgs, StatusArgs, VarsArgs,
};
use crate::commands::{
    codegen_command, list_command, prepare_project, report_command, run_command, CodegenPlan,
    CodegenTarget, CommandListSource,
};
use crate::config::{ConfigError, PanelConfig};
use crate::env_vars::{read_env_var_names, NameCheck, ENV_CONFIG_FILE};
use crate::fixtures::{FixtureError, FixtureReloader, ReloadOutcome, ScanRequest};
use crate::invocation::{InvocationError, ToolOutput};
use crate::locator::{CaseKey, FIELD_SEPARATOR};
use crate::logs::{ProcessEvent, ProcessId};
use crate::markup;
use crate::resolver::{resolve_from_current_dir, ResolveError, ResolvedProject};
use crate::selection::{self, SelectionRow};
use crate::session::RunMonitor;
use crate::status::{extract_statuses, latest_by_case, TestStatus, TestStatusRecord};
use crate::ui::theme::no_color_requested;
use crate::ui::{
    KeyValue, MessageBlock, NoticeLevel, OutputMode, PlainRenderer, Renderer, ResultMark,
    SummaryCounts, TableSpec, UiError,
};

const FIXTURE_SCAN_TIMEOUT: Duration = Duration::from_secs(10);
const FOLLOW_PROCESS: ProcessId = ProcessId::new(1);

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Fixtures(#[from] FixtureError),
    #[error(transparent)]
    Prepare(#[from] InvocationError),
    #[error("ui render failed: {0}")]
    Ui(#[from] UiError),
    #[error("failed to encode json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("fixture scan of {} did not finish within {}s", path.display(), timeout.as_secs())]
    FixtureScanTimeout { path: PathBuf, timeout: Duration },
}

impl RunnerError {
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            RunnerError::Catalog(error) => error.diagnostic(),
            RunnerError::Prepare(error) => error.diagnostic(),
            _ => None,
        }
    }

    pub fn into_message_block(self) -> MessageBlock {
        let title = match &self {
            RunnerError::Resolve(_) => "Project not found",
            RunnerError::Config(_) => "Invalid configuration",
            RunnerError::Catalog(_) => "Test listing failed",
            RunnerError::Prepare(_) => "Project prepare failed",
            RunnerError::Fixtures(_) | RunnerError::FixtureScanTimeout { .. } => {
                "Fixture scan failed"
            }
            _ => "Command failed",
        };
        let mut block = MessageBlock::new(title, self.to_string());
        if let Some(diagnostic) = self.diagnostic() {
            block = block.with_detail(diagnostic);
        }
        if let RunnerError::Resolve(ResolveError::NoCandidateRoot { .. }) = &self {
            block = block.with_hint("pass --repo <PATH> or add a playdeck.toml");
        }
        block
    }
}

pub fn run(cli: Cli) -> Result<String, RunnerError> {
    let Cli { repo, command } = cli;
    match command {
        Command::List(args) => run_list(repo, args),
        Command::Status(args) => run_status(repo, args),
        Command::Markup(args) => run_markup(args),
        Command::Follow(args) => run_follow(repo, args),
        Command::Fixtures(args) => run_fixtures(repo, args),
        Command::Codegen(args) => run_codegen(repo, args),
        Command::Commands(args) => run_commands(repo, args),
        Command::Prepare => run_prepare(repo),
        Command::Vars(args) => run_vars(repo, args),
    }
}

fn output_renderer() -> PlainRenderer<Vec<u8>> {
    let color_enabled = OutputMode::from_env()
        .color_enabled(std::io::stdout().is_terminal(), no_color_requested());
    PlainRenderer::new(Vec::<u8>::new(), color_enabled)
}

fn finish(renderer: PlainRenderer<Vec<u8>>) -> String {
    String::from_utf8_lossy(&renderer.into_inner())
        .trim_end()
        .to_owned()
}

fn resolve_or_cwd(repo: Option<PathBuf>) -> Result<ResolvedProject, RunnerError> {
    match resolve_from_current_dir(repo) {
        Ok(resolved) => Ok(resolved),
        Err(ResolveError::NoCandidateRoot { cwd }) => {
            debug!(cwd = %cwd.display(), "no project root found; using current directory");
            Ok(ResolvedProject {
                root: cwd,
                mode: crate::resolver::ResolutionMode::AutoNearest,
                evidence: vec!["fell back to the current directory".to_owned()],
            })
        }
        Err(error) => Err(error.into()),
    }
}

fn read_input(path: &Path) -> Result<String, RunnerError> {
    let mut bytes = Vec::new();
    let read = if is_stdin(path) {
        std::io::stdin().lock().read_to_end(&mut bytes).map(|_| ())
    } else {
        fs::read(path).map(|content| bytes = content)
    };
    read.map_err(|source| RunnerError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_catalog(path: &Path, project_root: &str) -> Result<Vec<TestDescriptor>, RunnerError> {
    Ok(parse_catalog(&read_input(path)?, project_root)?)
}

struct CapturedListSource {
    output: String,
}

impl ListSource for CapturedListSource {
    fn list(&mut self, _filter: Option<&str>) -> Result<ToolOutput, CatalogError> {
        Ok(ToolOutput {
            stdout: self.output.clone(),
            stderr: String::new(),
        })
    }
}

#[derive(Debug, Serialize)]
struct CatalogReport<'a> {
    root: &'a str,
    filter: Option<&'a str>,
    message: Option<String>,
    tests: &'a [TestDescriptor],
}

pub fn run_list(repo: Option<PathBuf>, args: ListArgs) -> Result<String, RunnerError> {
    let resolved = if args.from.is_some() {
        resolve_or_cwd(repo)?
    } else {
        resolve_from_current_dir(repo)?
    };
    let config = PanelConfig::load(&resolved.root)?;
    let root = resolved.root_str();
    let filter = args.grep.or(config.tests.grep);

    let outcome = match &args.from {
        Some(path) => {
            let mut source = CapturedListSource {
                output: read_input(path)?,
            };
            load_catalog(&mut source, filter.as_deref(), &root)?
        }
        None => {
            let mut source = CommandListSource::new(&resolved.root, config.tests.command.clone());
            let mut progress = PlainRenderer::stderr(OutputMode::from_env());
            let spinner = progress.spinner("Listing tests")?;
            match load_catalog(&mut source, filter.as_deref(), &root) {
                Ok(outcome) => {
                    spinner.finish_success(&outcome.to_string());
                    outcome
                }
                Err(error) => {
                    spinner.finish_error("listing failed");
                    return Err(error.into());
                }
            }
        }
    };
    info!(root = %root, tests = outcome.tests().len(), "loaded catalog");

    if args.json {
        let message = match &outcome {
            CatalogOutcome::Listed(_) => None,
            CatalogOutcome::NoMatches { .. } => Some(outcome.to_string()),
        };
        let report = CatalogReport {
            root: &root,
            filter: filter.as_deref(),
            message,
            tests: outcome.tests(),
        };
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let mut renderer = output_renderer();
    renderer.section("Test Catalog")?;
    let mut facts = vec![KeyValue::new("root", root.as_str())];
    if let Some(filter) = &filter {
        facts.push(KeyValue::new("grep", filter.as_str()));
    }
    facts.push(KeyValue::new("tests", outcome.tests().len().to_string()));
    renderer.key_values(&facts)?;
    renderer.text("")?;
    match &outcome {
        CatalogOutcome::Listed(catalog) => renderer.table(&catalog_table(catalog))?,
        CatalogOutcome::NoMatches { .. } => {
            renderer.notice(NoticeLevel::Info, &outcome.to_string())?
        }
    }
    Ok(finish(renderer))
}

fn catalog_table(catalog: &[TestDescriptor]) -> TableSpec {
    TableSpec::new(
        vec!["kind".to_owned(), "path".to_owned(), "name".to_owned()],
        catalog
            .iter()
            .map(|test| {
                vec![
                    test.kind.label().to_owned(),
                    test.path.clone(),
                    test.name.clone(),
                ]
            })
            .collect(),
    )
}

#[derive(Debug, Serialize)]
struct LatestStatus<'a> {
    #[serde(flatten)]
    key: &'a CaseKey,
    status: TestStatus,
}

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    records: &'a [TestStatusRecord],
    latest: Vec<LatestStatus<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selection: Option<&'a [SelectionRow]>,
}

pub fn run_status(repo: Option<PathBuf>, args: StatusArgs) -> Result<String, RunnerError> {
    let resolved = resolve_or_cwd(repo)?;
    let root = resolved.root_str();
    let raw = read_input(&args.input)?;
    let records = extract_statuses(&raw, &root);
    let latest = latest_by_case(&records);

    // A captured log is a finished run: selected tests without a result were
    // skipped, not pending.
    let rows = match &args.catalog {
        Some(path) => {
            let catalog = read_catalog(path, &root)?;
            Some(selection::join(&catalog, &catalog, &records, false))
        }
        None => None,
    };

    if args.json {
        let report = StatusReport {
            records: &records,
            latest: latest
                .iter()
                .map(|(key, status)| LatestStatus {
                    key,
                    status: *status,
                })
                .collect(),
            selection: rows.as_deref(),
        };
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let mut renderer = output_renderer();
    let mut counts = SummaryCounts::default();
    match &rows {
        Some(rows) => {
            renderer.section("Run Selection")?;
            for row in rows {
                let mark = ResultMark::from(row.display);
                counts.record(mark);
                renderer.result(&test_label(&row.test), mark)?;
            }
        }
        None => {
            renderer.section("Run Results")?;
            if latest.is_empty() {
                renderer.notice(NoticeLevel::Warning, "no result lines found")?;
            }
            for (key, status) in &latest {
                let mark = ResultMark::from(*status);
                counts.record(mark);
                renderer.result(&case_label(key), mark)?;
            }
        }
    }
    renderer.text("")?;
    renderer.summary(counts)?;
    Ok(finish(renderer))
}

fn test_label(test: &TestDescriptor) -> String {
    format!("{}{FIELD_SEPARATOR}{}", test.path, test.name)
}

fn case_label(key: &CaseKey) -> String {
    format!("{}{FIELD_SEPARATOR}{}", key.path, key.title)
}

pub fn run_markup(args: MarkupArgs) -> Result<String, RunnerError> {
    let raw = read_input(&args.input)?;
    Ok(markup::convert(&raw))
}

pub fn run_follow(repo: Option<PathBuf>, args: FollowArgs) -> Result<String, RunnerError> {
    let resolved = resolve_or_cwd(repo)?;
    let root = resolved.root_str();
    let catalog = match &args.catalog {
        Some(path) => Some(read_catalog(path, &root)?),
        None => None,
    };
    let mut renderer = PlainRenderer::stdout(OutputMode::from_env());
    let stdin = std::io::stdin();
    follow_log(stdin.lock(), &mut renderer, &root, catalog.as_deref())?;
    Ok(String::new())
}

pub fn follow_log<R, W>(
    mut reader: R,
    renderer: &mut PlainRenderer<W>,
    project_root: &str,
    catalog: Option<&[TestDescriptor]>,
) -> Result<SummaryCounts, RunnerError>
where
    R: BufRead,
    W: Write,
{
    let mut monitor = RunMonitor::new(project_root);
    monitor.start(FOLLOW_PROCESS);
    let mut reported = 0usize;
    let mut chunk = Vec::new();
    loop {
        chunk.clear();
        let read = reader
            .read_until(b'\n', &mut chunk)
            .map_err(|source| RunnerError::Input {
                path: PathBuf::from("-"),
                source,
            })?;
        if read == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&chunk);
        let Some(update) = monitor.apply(&ProcessEvent::stdout(FOLLOW_PROCESS, text)) else {
            continue;
        };
        for record in update.statuses.iter().skip(reported) {
            renderer.result(
                &format!("{}{FIELD_SEPARATOR}{} [{}]", record.path, record.title, record.kind),
                ResultMark::from(record.status),
            )?;
        }
        reported = update.statuses.len();
        renderer.flush()?;
    }

    let records = monitor.snapshot().statuses;
    let mut counts = SummaryCounts::default();
    renderer.text("")?;
    match catalog {
        Some(catalog) => {
            renderer.section("Run Selection")?;
            for row in selection::join(catalog, catalog, &records, false) {
                let mark = ResultMark::from(row.display);
                counts.record(mark);
                renderer.result(&test_label(&row.test), mark)?;
            }
        }
        None => {
            for status in latest_by_case(&records).values() {
                counts.record(ResultMark::from(*status));
            }
        }
    }
    renderer.summary(counts)?;
    renderer.flush()?;
    Ok(counts)
}

#[derive(Debug, Serialize)]
struct FixtureReport<'a> {
    session_root: String,
    fixtures: &'a [crate::fixtures::AuthFixture],
}

pub fn run_fixtures(repo: Option<PathBuf>, args: FixturesArgs) -> Result<String, RunnerError> {
    let resolved = resolve_from_current_dir(repo)?;
    let config = PanelConfig::load(&resolved.root)?;
    let session_root = config.session_root(&resolved.root);

    let mut reloader = FixtureReloader::new();
    reloader.request(ScanRequest {
        session_root: session_root.clone(),
        project_root: resolved.root.clone(),
        artifact: config.session.artifact.clone(),
    });
    match reloader.wait_timeout(FIXTURE_SCAN_TIMEOUT) {
        Some(ReloadOutcome::Updated(_)) => {}
        Some(ReloadOutcome::Failed(_, error)) => return Err(error.into()),
        Some(ReloadOutcome::Stale(_)) | None => {
            return Err(RunnerError::FixtureScanTimeout {
                path: session_root,
                timeout: FIXTURE_SCAN_TIMEOUT,
            })
        }
    }
    let fixtures = reloader.fixtures();

    if args.json {
        let report = FixtureReport {
            session_root: session_root.to_string_lossy().into_owned(),
            fixtures,
        };
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let mut renderer = output_renderer();
    renderer.section("Auth Fixtures")?;
    renderer.key_values(&[
        KeyValue::new("session", session_root.display().to_string()),
        KeyValue::new("artifact", config.session.artifact.as_str()),
    ])?;
    renderer.text("")?;
    if fixtures.is_empty() {
        renderer.notice(NoticeLevel::Warning, "no stored authentication found")?;
    } else {
        renderer.table(&TableSpec::new(
            vec!["name".to_owned(), "path".to_owned()],
            fixtures
                .iter()
                .map(|fixture| vec![fixture.display_name.clone(), fixture.relative_path.clone()])
                .collect(),
        ))?;
    }
    Ok(finish(renderer))
}

pub fn run_codegen(repo: Option<PathBuf>, args: CodegenArgs) -> Result<String, RunnerError> {
    let resolved = resolve_from_current_dir(repo)?;
    let config = PanelConfig::load(&resolved.root)?;
    let CodegenArgs {
        output_dir,
        output_file,
        url,
        load,
        no_save,
    } = args;
    let target = match (output_dir, output_file) {
        (Some(dir), _) => CodegenTarget::Setup {
            dir,
            save_auth: !no_save,
        },
        (None, Some(file)) => CodegenTarget::Test { file },
        (None, None) => CodegenTarget::Setup {
            dir: config.session.dir.clone(),
            save_auth: !no_save,
        },
    };
    let plan = CodegenPlan {
        target,
        url,
        load_fixture: load,
    };
    Ok(codegen_command(
        &config.codegen.command,
        &plan,
        &resolved.root,
        &config.session.artifact,
    ))
}

pub fn run_commands(repo: Option<PathBuf>, args: CommandsArgs) -> Result<String, RunnerError> {
    let resolved = resolve_from_current_dir(repo)?;
    let config = PanelConfig::load(&resolved.root)?;
    let filter = args.grep.or(config.tests.grep);

    let mut renderer = output_renderer();
    renderer.key_values(&[
        KeyValue::new("root", resolved.root_str()),
        KeyValue::new("list", list_command(&config.tests.command, filter.as_deref())),
        KeyValue::new("run", run_command(&config.tests.command, filter.as_deref())),
        KeyValue::new("report", report_command(&config.tests.report_command)),
        KeyValue::new("prepare", config.tests.prepare_command.trim()),
    ])?;
    Ok(finish(renderer))
}

pub fn run_prepare(repo: Option<PathBuf>) -> Result<String, RunnerError> {
    let resolved = resolve_from_current_dir(repo)?;
    let config = PanelConfig::load(&resolved.root)?;
    let command = config.tests.prepare_command.trim();

    let mut progress = PlainRenderer::stderr(OutputMode::from_env());
    let spinner = progress.spinner("Preparing project")?;
    let output = match prepare_project(&resolved.root, command) {
        Ok(output) => {
            spinner.finish_success("project prepared");
            output
        }
        Err(error) => {
            spinner.finish_error("prepare failed");
            return Err(error.into());
        }
    };
    info!(root = %resolved.root.display(), command, "prepared project");

    let mut renderer = output_renderer();
    renderer.section("Project Prepare")?;
    renderer.key_values(&[
        KeyValue::new("root", resolved.root_str()),
        KeyValue::new("command", command),
    ])?;
    renderer.text("")?;
    let stdout = output.stdout.trim_end();
    if stdout.is_empty() {
        renderer.notice(NoticeLevel::Info, "prepare finished without output")?;
    } else {
        for line in stdout.lines() {
            renderer.text(line)?;
        }
    }
    Ok(finish(renderer))
}

#[derive(Debug, Serialize)]
struct VarsReport<'a> {
    file: String,
    names: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    check: Option<&'a NameCheck>,
}

pub fn run_vars(repo: Option<PathBuf>, args: VarsArgs) -> Result<String, RunnerError> {
    let resolved = resolve_from_current_dir(repo)?;
    let file = resolved.root.join(ENV_CONFIG_FILE);
    let names = read_env_var_names(&resolved.root);
    let check = args.name.as_deref().map(|name| NameCheck::new(name, &names));

    if args.json {
        let report = VarsReport {
            file: file.to_string_lossy().into_owned(),
            names: &names,
            check: check.as_ref(),
        };
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let mut renderer = output_renderer();
    renderer.section("Environment Variables")?;
    renderer.key_values(&[
        KeyValue::new("file", file.display().to_string()),
        KeyValue::new("variables", names.len().to_string()),
    ])?;
    renderer.text("")?;
    if names.is_empty() {
        renderer.notice(NoticeLevel::Info, "no variables declared")?;
    } else {
        renderer.table(&TableSpec::new(
            vec!["name".to_owned()],
            names.iter().map(|name| vec![name.clone()]).collect(),
        ))?;
    }

    if let Some(check) = &check {
        renderer.text("")?;
        renderer.key_values(&[
            KeyValue::new("candidate", check.requested.as_str()),
            KeyValue::new("stored as", check.normalized.as_str()),
        ])?;
        if check.normalized.is_empty() {
            renderer.notice(NoticeLevel::Warning, "name is empty")?;
        } else if check.declared {
            renderer.notice(
                NoticeLevel::Warning,
                &format!("{} is already declared", check.normalized),
            )?;
        }
    }
    Ok(finish(renderer))
}

#[cfg(test)]
#[path = "tests/runner_tests.rs"]
mod tests;
