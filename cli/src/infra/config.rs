//! YAML config file on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::ConfigError;
use crate::domain::config::{CONFIG_TEMPLATE, DEFAULT_CONFIG_FILE, DeployFile};

/// Reads and writes the deploy config file.
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Use `path` if given, else `deploy.config.yaml` in `workdir`.
    #[must_use]
    pub fn resolve(path: Option<PathBuf>, workdir: &Path) -> Self {
        Self::new(path.unwrap_or_else(|| workdir.join(DEFAULT_CONFIG_FILE)))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and parse the config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file does not exist, or a
    /// parse error naming the file.
    pub fn load(&self) -> Result<DeployFile> {
        if !self.path.exists() {
            return Err(ConfigError::NotFound {
                path: self.path.display().to_string(),
            }
            .into());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read {}", self.path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", self.path.display()))
    }

    /// Write the starter template.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and `force` is false, or the
    /// write fails.
    pub fn write_template(&self, force: bool) -> Result<()> {
        anyhow::ensure!(
            force || !self.path.exists(),
            "{} already exists (use --force to overwrite)",
            self.path.display()
        );
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        std::fs::write(&self.path, CONFIG_TEMPLATE)
            .with_context(|| format!("cannot write {}", self.path.display()))?;

        // May hold passwords.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("cannot set permissions on {}", self.path.display()))?;
        }
        Ok(())
    }
}
