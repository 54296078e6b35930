use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diagnostics::CheckError;

pub const CONFIG_FILE_NAME: &str = "overcheck.toml";

/// Checker switches, read from the `[checker]` table of `overcheck.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    /// Allow an overriding method to narrow its return type.
    pub covariant_returns: bool,
    /// Report inherited abstract methods a concrete class leaves unimplemented.
    pub require_abstract_implementations: bool,
    /// Nesting limit for type expressions; deeper trees are `CyclicType`.
    pub max_type_depth: usize,
    /// Make the built-in declarations (`Object`, `Function`, ...) visible.
    pub prelude: bool,
    /// Worker threads for batch resolution; 0 picks the available parallelism.
    pub jobs: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            covariant_returns: true,
            require_abstract_implementations: true,
            max_type_depth: 64,
            prelude: true,
            jobs: 0,
        }
    }
}

// ---- TOML deserialization types ----

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    checker: CheckerConfig,
}

impl CheckerConfig {
    pub fn from_toml_str(contents: &str, path: Option<&Path>) -> Result<Self, CheckError> {
        let parsed: TomlConfig = toml::from_str(contents).map_err(|e| {
            CheckError::config(format!("failed to parse config: {e}"), path.map(Path::to_path_buf))
        })?;
        parsed.checker.validate(path)
    }

    pub fn load(path: &Path) -> Result<Self, CheckError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CheckError::config(format!("failed to read {}: {e}", path.display()), Some(path.to_path_buf()))
        })?;
        Self::from_toml_str(&contents, Some(path))
    }

    /// Walk up from `start_dir` looking for `overcheck.toml`; defaults if none.
    pub fn discover(start_dir: &Path) -> Result<Self, CheckError> {
        match find_config(start_dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading checker config");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Number of worker threads the batch runner should use.
    pub fn effective_jobs(&self) -> usize {
        if self.jobs > 0 {
            return self.jobs;
        }
        std::thread::available_parallelism().map_or(1, |n| n.get())
    }

    fn validate(self, path: Option<&Path>) -> Result<Self, CheckError> {
        if self.max_type_depth == 0 {
            return Err(CheckError::config(
                "'max_type_depth' must be at least 1",
                path.map(Path::to_path_buf),
            ));
        }
        Ok(self)
    }
}

fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}
