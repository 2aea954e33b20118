use crate::config::{CompiledConfig, ConfigError, ManagerConfig};
use crate::model::PackageFile;
use crate::traits::PackageManager;
use tracing::{debug, info, instrument};

/// Runs a [`PackageManager`] over the files its configuration matches.
pub struct ManagerExecutor<M> {
    manager: M,
    config: CompiledConfig,
}

impl<M: PackageManager> ManagerExecutor<M> {
    /// Uses the manager's default file patterns.
    pub fn new(manager: M) -> Result<Self, ConfigError> {
        let config = manager.default_config();
        Self::with_config(manager, &config)
    }

    pub fn with_config(manager: M, config: &ManagerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            manager,
            config: config.compile()?,
        })
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    pub fn handles(&self, path: &str) -> bool {
        self.config.matches(path)
    }

    /// Extracts dependencies from `content` if `path` is a file this manager
    /// handles.
    #[instrument(skip(self, content), fields(manager = self.manager.manager_id()))]
    pub fn extract_file(&self, path: &str, content: &str) -> Option<PackageFile> {
        if !self.handles(path) {
            debug!("File not matched");
            return None;
        }

        let result = self.manager.extract_package_file(content);
        match &result {
            Some(file) => info!(deps = file.deps.len(), "Extracted dependencies"),
            None => debug!("No dependencies found"),
        }
        result
    }

    /// Extracts every matched file, keeping input order and dropping files
    /// without dependencies.
    pub fn extract_files<'a, I>(&self, files: I) -> Vec<(&'a str, PackageFile)>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        files
            .into_iter()
            .filter_map(|(path, content)| {
                self.extract_file(path, content)
                    .map(|file| (path, file))
            })
            .collect()
    }
}
