use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::sequence::{RequestSequencer, Ticket};

pub const DEFAULT_SESSION_DIR: &str = "session";
pub const DEFAULT_AUTH_ARTIFACT: &str = "auth.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthFixture {
    pub relative_path: String,
    pub display_name: String,
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read session directory {}: {source}", path.display())]
    ReadRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn scan_auth_fixtures(
    session_root: &Path,
    project_root: &Path,
    artifact: &str,
) -> Result<Vec<AuthFixture>, FixtureError> {
    let entries = fs::read_dir(session_root).map_err(|source| FixtureError::ReadRoot {
        path: session_root.to_path_buf(),
        source,
    })?;

    let mut fixtures = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                debug!(root = %session_root.display(), %error, "skipped unreadable session entry");
                continue;
            }
        };
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        match fs::read(dir.join(artifact)) {
            Ok(content) if !content.is_empty() => {}
            Ok(_) => {
                debug!(dir = %dir.display(), "excluded fixture with empty artifact");
                continue;
            }
            Err(error) => {
                debug!(dir = %dir.display(), %error, "excluded fixture without readable artifact");
                continue;
            }
        }
        fixtures.push(AuthFixture {
            relative_path: relative_display(&dir, project_root),
            display_name: entry.file_name().to_string_lossy().into_owned(),
        });
    }

    fixtures.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(fixtures)
}

fn relative_display(path: &Path, project_root: &Path) -> String {
    path.strip_prefix(project_root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub session_root: PathBuf,
    pub project_root: PathBuf,
    pub artifact: String,
}

impl ScanRequest {
    pub fn run(&self) -> Result<Vec<AuthFixture>, FixtureError> {
        scan_auth_fixtures(&self.session_root, &self.project_root, &self.artifact)
    }
}

type ScanResult = (Ticket, Result<Vec<AuthFixture>, FixtureError>);

#[derive(Debug)]
pub enum ReloadOutcome {
    Stale(Ticket),
    Updated(Ticket),
    Failed(Ticket, FixtureError),
}

#[derive(Debug)]
pub struct FixtureReloader {
    sequencer: RequestSequencer,
    results_tx: Sender<ScanResult>,
    results_rx: Receiver<ScanResult>,
    fixtures: Vec<AuthFixture>,
}

impl Default for FixtureReloader {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureReloader {
    pub fn new() -> Self {
        let (results_tx, results_rx) = mpsc::channel();
        Self {
            sequencer: RequestSequencer::new(),
            results_tx,
            results_rx,
            fixtures: Vec::new(),
        }
    }

    pub fn fixtures(&self) -> &[AuthFixture] {
        &self.fixtures
    }

    pub fn request(&mut self, request: ScanRequest) -> Ticket {
        let ticket = self.sequencer.issue();
        let tx = self.results_tx.clone();
        thread::spawn(move || {
            let _ = tx.send((ticket, request.run()));
        });
        ticket
    }

    pub fn apply(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<AuthFixture>, FixtureError>,
    ) -> ReloadOutcome {
        if !self.sequencer.accept(ticket) {
            debug!(ticket = ticket.value(), "dropped superseded fixture scan");
            return ReloadOutcome::Stale(ticket);
        }
        match result {
            Ok(fixtures) => {
                self.fixtures = fixtures;
                ReloadOutcome::Updated(ticket)
            }
            Err(error) => {
                self.fixtures.clear();
                ReloadOutcome::Failed(ticket, error)
            }
        }
    }

    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<ReloadOutcome> {
        match self.results_rx.recv_timeout(timeout) {
            Ok((ticket, result)) => Some(self.apply(ticket, result)),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
#[path = "tests/fixtures_tests.rs"]
mod tests;
