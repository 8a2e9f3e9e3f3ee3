use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::fixtures::{DEFAULT_AUTH_ARTIFACT, DEFAULT_SESSION_DIR};

pub const CONFIG_FILE: &str = "playdeck.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct PanelConfig {
    pub tests: TestsConfig,
    pub session: SessionConfig,
    pub codegen: CodegenConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct TestsConfig {
    pub command: String,
    pub report_command: String,
    pub prepare_command: String,
    pub grep: Option<String>,
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            command: "./tasks.sh test".to_owned(),
            report_command: "./tasks.sh report".to_owned(),
            prepare_command: "./tasks.sh prepare".to_owned(),
            grep: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SessionConfig {
    pub dir: PathBuf,
    pub artifact: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_SESSION_DIR),
            artifact: DEFAULT_AUTH_ARTIFACT.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct CodegenConfig {
    pub command: String,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            command: "./tasks.sh codegen".to_owned(),
        }
    }
}

impl PanelConfig {
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let path = project_root.join(CONFIG_FILE);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        Self::from_toml_str(&source, &path)
    }

    pub fn from_toml_str(source: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn session_root(&self, project_root: &Path) -> PathBuf {
        if self.session.dir.is_absolute() {
            self.session.dir.clone()
        } else {
            project_root.join(&self.session.dir)
        }
    }
}
