use std::path::Path;
use std::process::Command as ProcessCommand;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn diagnostic(&self) -> Option<&str> {
        let trimmed = self.stderr.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("`{command}` reported an error:\n{diagnostic}")]
    Diagnostic { command: String, diagnostic: String },
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl InvocationError {
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            InvocationError::Diagnostic { diagnostic, .. } => Some(diagnostic),
            InvocationError::Launch { .. } => None,
        }
    }
}

/// A diagnostic on the retry is returned verbatim as `InvocationError::Diagnostic`.
pub fn retry_once_on_diagnostic<F, E>(command: &str, mut invoke: F) -> Result<ToolOutput, E>
where
    F: FnMut() -> Result<ToolOutput, E>,
    E: From<InvocationError>,
{
    let first = invoke()?;
    let Some(diagnostic) = first.diagnostic() else {
        return Ok(first);
    };
    warn!(command, diagnostic, "tool reported diagnostics; retrying");
    let second = invoke()?;
    match second.diagnostic() {
        Some(diagnostic) => Err(InvocationError::Diagnostic {
            command: command.to_owned(),
            diagnostic: diagnostic.to_owned(),
        }
        .into()),
        None => Ok(second),
    }
}

pub fn run_in_shell(project_root: &Path, command: &str) -> Result<ToolOutput, InvocationError> {
    debug!(command, root = %project_root.display(), "running tool invocation");
    let mut process = ProcessCommand::new("sh");
    process.arg("-lc").arg(command).current_dir(project_root);
    with_local_node_bin_path(&mut process, project_root);
    let output = process.output().map_err(|source| InvocationError::Launch {
        command: command.to_owned(),
        source,
    })?;
    Ok(ToolOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

fn with_local_node_bin_path(process: &mut ProcessCommand, cwd: &Path) {
    let local_bin = cwd.join("node_modules/.bin");
    if !local_bin.is_dir() {
        return;
    }
    let local_rendered = local_bin.display().to_string();
    let merged = match std::env::var("PATH") {
        Ok(path) if !path.is_empty() => format!("{local_rendered}:{path}"),
        _ => local_rendered,
    };
    process.env("PATH", merged);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn scripted(outputs: &[(&str, &str)]) -> VecDeque<ToolOutput> {
        outputs
            .iter()
            .map(|(stdout, stderr)| ToolOutput {
                stdout: (*stdout).to_owned(),
                stderr: (*stderr).to_owned(),
            })
            .collect()
    }

    #[test]
    fn clean_output_is_not_retried() {
        let mut outputs = scripted(&[("ok\n", ""), ("unused", "")]);
        let output = retry_once_on_diagnostic::<_, InvocationError>("prepare", || {
            Ok(outputs.pop_front().expect("scripted output"))
        })
        .expect("clean run");
        assert_eq!(output.stdout, "ok\n");
        assert_eq!(outputs.len(), 1);
    }

    #[test]
    fn second_diagnostic_is_returned_verbatim() {
        let mut outputs = scripted(&[("", "warming up\n"), ("", "  Error: missing deps\n")]);
        let err = retry_once_on_diagnostic::<_, InvocationError>("prepare", || {
            Ok(outputs.pop_front().expect("scripted output"))
        })
        .expect_err("persistent diagnostic");
        assert_eq!(err.diagnostic(), Some("Error: missing deps"));
        assert!(outputs.is_empty());
    }

    #[test]
    fn transient_diagnostic_recovers_on_retry() {
        let mut outputs = scripted(&[("", "warming up\n"), ("ready\n", " \n")]);
        let output = retry_once_on_diagnostic::<_, InvocationError>("prepare", || {
            Ok(outputs.pop_front().expect("scripted output"))
        })
        .expect("retry succeeds");
        assert_eq!(output.stdout, "ready\n");
    }
}
