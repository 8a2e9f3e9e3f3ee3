use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::invocation::{retry_once_on_diagnostic, InvocationError, ToolOutput};
use crate::locator::{normalize_locator, CaseKey, FIELD_SEPARATOR};

pub const LIST_HEADER: &str = "Listing tests:";
pub const LIST_FOOTER: &str = "Total: ";

const SETUP_TAG: &str = "[setup]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestKind {
    Test,
    AuthSetup,
}

impl TestKind {
    pub fn from_tag(tag: &str) -> Self {
        if tag == SETUP_TAG {
            TestKind::AuthSetup
        } else {
            TestKind::Test
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TestKind::Test => "test",
            TestKind::AuthSetup => "auth",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TestDescriptor {
    pub kind: TestKind,
    pub path: String,
    pub name: String,
}

impl TestDescriptor {
    pub fn case_key(&self) -> CaseKey {
        CaseKey::new(self.path.clone(), &self.name)
    }
}

pub type Catalog = Vec<TestDescriptor>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not parse test list output (unexpected format)")]
    UnexpectedFormat { output: String },
    #[error("failed to list tests:\n{diagnostic}")]
    ToolDiagnostic { diagnostic: String },
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            CatalogError::UnexpectedFormat { output } => Some(output),
            CatalogError::ToolDiagnostic { diagnostic } => Some(diagnostic),
            CatalogError::Launch { .. } => None,
        }
    }
}

impl From<InvocationError> for CatalogError {
    fn from(err: InvocationError) -> Self {
        match err {
            InvocationError::Diagnostic { diagnostic, .. } => {
                CatalogError::ToolDiagnostic { diagnostic }
            }
            InvocationError::Launch { command, source } => CatalogError::Launch { command, source },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogOutcome {
    Listed(Catalog),
    NoMatches { filter: Option<String> },
}

impl CatalogOutcome {
    pub fn tests(&self) -> &[TestDescriptor] {
        match self {
            CatalogOutcome::Listed(catalog) => catalog,
            CatalogOutcome::NoMatches { .. } => &[],
        }
    }
}

impl fmt::Display for CatalogOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogOutcome::Listed(catalog) => write!(f, "{} tests listed", catalog.len()),
            CatalogOutcome::NoMatches {
                filter: Some(filter),
            } => write!(f, "No tests matched current grep \"{filter}\""),
            CatalogOutcome::NoMatches { filter: None } => write!(f, "No tests found."),
        }
    }
}

pub trait ListSource {
    fn list(&mut self, filter: Option<&str>) -> Result<ToolOutput, CatalogError>;
}

pub fn parse_catalog(output: &str, project_root: &str) -> Result<Catalog, CatalogError> {
    let lines = output
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect::<Vec<&str>>();
    let header = lines.iter().position(|line| line.starts_with(LIST_HEADER));
    let footer = lines.iter().position(|line| line.starts_with(LIST_FOOTER));
    let (Some(header), Some(footer)) = (header, footer) else {
        return Err(unexpected_format(output));
    };
    if footer <= header {
        return Err(unexpected_format(output));
    }

    let catalog = lines[header + 1..footer]
        .iter()
        .filter(|line| !line.is_empty())
        .filter_map(|line| parse_entry(line, project_root))
        .collect::<Catalog>();
    Ok(catalog)
}

fn parse_entry(line: &str, project_root: &str) -> Option<TestDescriptor> {
    let fields = line.trim().split(FIELD_SEPARATOR).collect::<Vec<&str>>();
    let [tag, locator, name] = fields.as_slice() else {
        debug!(line, fields = fields.len(), "dropped malformed catalog line");
        return None;
    };
    Some(TestDescriptor {
        kind: TestKind::from_tag(tag),
        path: normalize_locator(locator, project_root),
        name: (*name).to_owned(),
    })
}

fn unexpected_format(output: &str) -> CatalogError {
    CatalogError::UnexpectedFormat {
        output: output.to_owned(),
    }
}

pub fn load_catalog<S>(
    source: &mut S,
    filter: Option<&str>,
    project_root: &str,
) -> Result<CatalogOutcome, CatalogError>
where
    S: ListSource + ?Sized,
{
    let output = retry_once_on_diagnostic("list", || source.list(filter))?;

    let catalog = parse_catalog(&output.stdout, project_root)?;
    if catalog.is_empty() {
        return Ok(CatalogOutcome::NoMatches {
            filter: filter.map(str::to_owned),
        });
    }
    Ok(CatalogOutcome::Listed(catalog))
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
