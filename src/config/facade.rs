//! Config loader facade: composes the merge policy and sources into a `CorpusConfig`.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::CorpusConfig;
use crate::error::ApiError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence, lowest to highest: defaults, global file, `config/config.toml`,
    /// `config/{CORPUSGEN_ENV}.toml`, `CORPUSGEN__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<CorpusConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: CorpusConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from an explicit file. Global and workspace files are skipped;
    /// environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<CorpusConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = environment::add_to_builder(builder);

        let config: CorpusConfig = builder.build()?.try_deserialize()?;
        debug!(config_path = %path.display(), "Configuration loaded from file");
        Ok(config)
    }

    /// Location of the user-level configuration file, if resolvable.
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Built-in defaults without consulting any source.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> CorpusConfig {
        CorpusConfig::default()
    }
}
