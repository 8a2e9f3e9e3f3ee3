use std::path::{Path, PathBuf};

use tracing::debug;

use crate::catalog::{CatalogError, ListSource};
use crate::invocation::{retry_once_on_diagnostic, run_in_shell, InvocationError, ToolOutput};

pub const QUIET_TOOL_ENV: &str = "PLAYWRIGHT_FORCE_TTY=0 FORCE_COLOR=0";

const SETUP_SCRIPT: &str = "setup.ts";

pub fn list_command(test_command: &str, filter: Option<&str>) -> String {
    let mut parts = vec![
        QUIET_TOOL_ENV.to_owned(),
        test_command.to_owned(),
        "--reporter=list".to_owned(),
        "--list".to_owned(),
    ];
    parts.extend(filter.map(grep_arg));
    parts.join(" ")
}

pub fn run_command(test_command: &str, filter: Option<&str>) -> String {
    let mut parts = vec![QUIET_TOOL_ENV.to_owned(), test_command.to_owned()];
    parts.extend(filter.map(grep_arg));
    parts.join(" ")
}

pub fn report_command(report_command: &str) -> String {
    report_command.trim().to_owned()
}

fn grep_arg(filter: &str) -> String {
    quote_arg(&format!("--grep=/{filter}/"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenTarget {
    Setup { dir: PathBuf, save_auth: bool },
    Test { file: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenPlan {
    pub target: CodegenTarget,
    pub url: String,
    pub load_fixture: Option<PathBuf>,
}

pub fn codegen_command(
    codegen_command: &str,
    plan: &CodegenPlan,
    project_root: &Path,
    artifact: &str,
) -> String {
    let mut parts = vec![QUIET_TOOL_ENV.to_owned(), codegen_command.to_owned()];
    match &plan.target {
        CodegenTarget::Setup { dir, save_auth } => {
            let dir = project_relative(dir, project_root);
            parts.push(quote_arg(&format!("--output={}", dir.join(SETUP_SCRIPT).display())));
            if *save_auth {
                parts.push(quote_arg(&format!(
                    "--save-storage={}",
                    dir.join(artifact).display()
                )));
            }
        }
        CodegenTarget::Test { file } => {
            let file = project_relative(file, project_root);
            parts.push(quote_arg(&format!("--output={}", file.display())));
        }
    }
    if let Some(fixture) = &plan.load_fixture {
        let fixture = project_relative(fixture, project_root);
        if fixture.is_absolute() {
            debug!(fixture = %fixture.display(), "skipped storage outside the project");
        } else {
            parts.push(quote_arg(&format!(
                "--load-storage={}",
                fixture.join(artifact).display()
            )));
        }
    }
    if !plan.url.trim().is_empty() {
        parts.push(quote_arg(plan.url.trim()));
    }
    parts.join(" ")
}

fn project_relative(path: &Path, project_root: &Path) -> PathBuf {
    path.strip_prefix(project_root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

pub fn quote_arg(raw: &str) -> String {
    let plain = !raw.is_empty()
        && raw.bytes().all(|byte| {
            byte.is_ascii_alphanumeric()
                || matches!(byte, b'-' | b'_' | b'=' | b'/' | b'.' | b':' | b',' | b'@' | b'+')
        });
    if plain {
        raw.to_owned()
    } else {
        shell_quote(raw)
    }
}

pub fn shell_quote(raw: &str) -> String {
    if raw.is_empty() {
        return "''".to_owned();
    }
    let escaped = raw.replace('\'', "'\"'\"'");
    format!("'{escaped}'")
}

#[derive(Debug, Clone)]
pub struct CommandListSource {
    project_root: PathBuf,
    test_command: String,
}

impl CommandListSource {
    pub fn new(project_root: impl Into<PathBuf>, test_command: impl Into<String>) -> Self {
        Self {
            project_root: project_root.into(),
            test_command: test_command.into(),
        }
    }
}

impl ListSource for CommandListSource {
    fn list(&mut self, filter: Option<&str>) -> Result<ToolOutput, CatalogError> {
        let command = list_command(&self.test_command, filter);
        Ok(run_in_shell(&self.project_root, &command)?)
    }
}

pub fn prepare_project(
    project_root: &Path,
    prepare_command: &str,
) -> Result<ToolOutput, InvocationError> {
    let command = prepare_command.trim();
    retry_once_on_diagnostic(command, || run_in_shell(project_root, command))
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
