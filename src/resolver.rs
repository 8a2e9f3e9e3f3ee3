use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

const ROOT_MARKERS: [&str; 5] = [
    "playdeck.toml",
    "tasks.sh",
    "playwright.config.ts",
    "playwright.config.js",
    "playwright.config.mjs",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMode {
    Explicit,
    AutoNearest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProject {
    pub root: PathBuf,
    pub mode: ResolutionMode,
    pub evidence: Vec<String>,
}

impl ResolvedProject {
    pub fn root_str(&self) -> String {
        self.root.to_string_lossy().into_owned()
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to resolve current directory: {0}")]
    Cwd(#[source] std::io::Error),
    #[error("explicit --repo path is not a directory: {}", path.display())]
    InvalidExplicitRoot { path: PathBuf },
    #[error(
        "could not find a test project above {} (looked for {}; use --repo <path>)",
        cwd.display(),
        ROOT_MARKERS.join(", ")
    )]
    NoCandidateRoot { cwd: PathBuf },
}

pub fn resolve_from_current_dir(
    repo_override: Option<PathBuf>,
) -> Result<ResolvedProject, ResolveError> {
    let cwd = std::env::current_dir().map_err(ResolveError::Cwd)?;
    resolve_project_root(cwd, repo_override)
}

pub fn resolve_project_root(
    cwd: PathBuf,
    repo_override: Option<PathBuf>,
) -> Result<ResolvedProject, ResolveError> {
    if let Some(explicit) = repo_override {
        let explicit = if explicit.is_absolute() {
            explicit
        } else {
            cwd.join(explicit)
        };
        let canonical = canonicalize_best_effort(explicit);
        if !canonical.is_dir() {
            return Err(ResolveError::InvalidExplicitRoot { path: canonical });
        }
        return Ok(ResolvedProject {
            root: canonical,
            mode: ResolutionMode::Explicit,
            evidence: vec!["resolved via explicit --repo override".to_owned()],
        });
    }

    let (root, marker) =
        find_nearest_candidate(&cwd).ok_or(ResolveError::NoCandidateRoot { cwd })?;
    debug!(root = %root.display(), marker, "resolved project root");
    Ok(ResolvedProject {
        evidence: vec![format!(
            "selected nearest directory containing {marker}: {}",
            root.display()
        )],
        root,
        mode: ResolutionMode::AutoNearest,
    })
}

fn find_nearest_candidate(cwd: &Path) -> Option<(PathBuf, &'static str)> {
    let mut current = Some(canonicalize_best_effort(cwd.to_path_buf()));
    while let Some(path) = current {
        if let Some(marker) = root_marker(&path) {
            return Some((path, marker));
        }
        current = path.parent().map(Path::to_path_buf);
    }
    None
}

fn root_marker(path: &Path) -> Option<&'static str> {
    ROOT_MARKERS
        .iter()
        .copied()
        .find(|marker| path.join(marker).is_file())
}

fn canonicalize_best_effort(path: PathBuf) -> PathBuf {
    fs::canonicalize(&path).unwrap_or(path)
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
