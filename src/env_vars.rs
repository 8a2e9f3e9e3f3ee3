use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

pub const ENV_CONFIG_FILE: &str = "env.config";

pub fn env_var_names(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.split_once('='))
        .map(|(key, _)| key.trim())
        .filter(|key| !key.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn normalize_var_name(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .chars()
        .map(|ch| match ch {
            'A'..='Z' | '0'..='9' | '_' => ch,
            _ => '_',
        })
        .collect()
}

pub fn read_env_var_names(project_root: &Path) -> Vec<String> {
    let path = project_root.join(ENV_CONFIG_FILE);
    match fs::read_to_string(&path) {
        Ok(content) => env_var_names(&content),
        Err(error) => {
            debug!(path = %path.display(), %error, "no readable env config; no variables");
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCheck {
    pub requested: String,
    pub normalized: String,
    pub declared: bool,
}

impl NameCheck {
    pub fn new(requested: &str, names: &[String]) -> Self {
        let normalized = normalize_var_name(requested);
        let declared = names.iter().any(|name| *name == normalized);
        Self {
            requested: requested.to_owned(),
            normalized,
            declared,
        }
    }

    pub fn is_usable(&self) -> bool {
        !self.normalized.is_empty() && !self.declared
    }
}
