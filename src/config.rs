//! Per-manager configuration.
//!
//! A [`ManagerConfig`] lists the file patterns a manager is responsible for.
//! It is compiled once into a [`CompiledConfig`], which is immutable and can
//! be shared freely between callers.

use regex::Regex;
use thiserror::Error;

/// Default pattern for Kustomization manifests.
pub const KUSTOMIZE_FILE_MATCH: &str = r"(^|/)kustomization\.ya?ml$";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid file match pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// File matching configuration for a package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Regular expressions tested against repository-relative paths
    pub file_match: Vec<String>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            file_match: vec![KUSTOMIZE_FILE_MATCH.to_string()],
        }
    }
}

impl ManagerConfig {
    /// Replaces the file patterns.
    pub fn with_file_match<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_match = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one file pattern to the existing ones.
    pub fn add_file_match(mut self, pattern: impl Into<String>) -> Self {
        self.file_match.push(pattern.into());
        self
    }

    /// Compiles the patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] for the first pattern that is
    /// not a valid regular expression.
    pub fn compile(&self) -> Result<CompiledConfig, ConfigError> {
        let file_match = self
            .file_match
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledConfig { file_match })
    }
}

#[derive(Debug, Clone)]
pub struct CompiledConfig {
    file_match: Vec<Regex>,
}

impl CompiledConfig {
    /// Whether any pattern matches `path`. Backslashes are treated as `/`.
    pub fn matches(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        self.file_match.iter().any(|re| re.is_match(&normalized))
    }
}
