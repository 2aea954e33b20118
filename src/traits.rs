use crate::config::ManagerConfig;
use crate::model::PackageFile;
use thiserror::Error;

/// Reasons a manifest, or a single entry in it, yields no dependency.
///
/// These never reach the caller of [`PackageManager::extract_package_file`];
/// they are logged and turned into `None` (or a skipped entry).
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to decode manifest: {0}")]
    Decode(#[from] serde_yaml::Error),
    #[error("Not a manifest this manager handles: {reason}")]
    SchemaMismatch { reason: String },
    #[error("Unrecognized reference '{reference}': {reason}")]
    ReferenceFormat { reference: String, reason: String },
}

impl ExtractError {
    pub(crate) fn schema(reason: impl Into<String>) -> Self {
        ExtractError::SchemaMismatch {
            reason: reason.into(),
        }
    }

    pub(crate) fn reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        ExtractError::ReferenceFormat {
            reference: reference.into(),
            reason: reason.into(),
        }
    }
}

pub trait PackageManager: Send + Sync {
    /// Returns the manager ID (e.g., "kustomize").
    fn manager_id(&self) -> &str;

    /// File patterns this manager claims when no override is configured.
    fn default_config(&self) -> ManagerConfig;

    /// Extracts dependencies from the text of one manifest file.
    ///
    /// Returns `None` when the file is not a recognized manifest or holds
    /// no extractable dependencies.
    fn extract_package_file(&self, content: &str) -> Option<PackageFile>;
}
