//! Scoped credential workspace
//!
//! Every build gets its own temporary `DOCKER_CONFIG` directory. Logins
//! performed during the build write there instead of the user's shared
//! `~/.docker/config.json`, and the directory is deleted afterwards.
//!
//! An existing `config.json` is copied in first so settings such as
//! credential helpers and proxies still apply.

use crate::docker::escape::shell_quote;
use crate::error::{DockyardError, DockyardResult};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tracing::debug;

/// Environment variable pointing the build tool at its config directory
pub const DOCKER_CONFIG_ENV: &str = "DOCKER_CONFIG";

/// Credential store file inside a config directory
pub const CONFIG_FILE: &str = "config.json";

/// Where to look for a previously cached credential store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialLocations {
    /// Directory named by `DOCKER_CONFIG`
    pub override_dir: Option<PathBuf>,
    /// User home; the store lives under `.docker/`
    pub home_dir: Option<PathBuf>,
}

impl CredentialLocations {
    /// Resolve locations from the process environment
    pub fn from_env() -> Self {
        Self {
            override_dir: std::env::var_os(DOCKER_CONFIG_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            home_dir: dirs::home_dir(),
        }
    }

    /// Candidate credential stores, highest priority first
    pub fn candidates(&self) -> Vec<PathBuf> {
        let home = self.home_dir.as_ref().map(|home| home.join(".docker"));
        self.override_dir
            .iter()
            .cloned()
            .chain(home)
            .map(|dir| dir.join(CONFIG_FILE))
            .collect()
    }

    /// First existing credential store, if there is one
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.candidates().into_iter().find(|path| path.is_file())
    }
}

/// Environment override that redirects the build tool to a workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverride {
    pub key: &'static str,
    pub value: PathBuf,
}

impl EnvOverride {
    /// Shell line that applies the override to the rest of the script
    pub fn export_command(&self) -> String {
        format!(
            "export {}={}",
            self.key,
            shell_quote(&self.value.to_string_lossy())
        )
    }
}

/// Ephemeral config directory for a single build.
///
/// Call [`ScopedWorkspace::release`] to remove it and observe failures.
/// Dropping the handle without releasing (early return, panic, cancelled
/// future) still removes the directory.
#[derive(Debug)]
pub struct ScopedWorkspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScopedWorkspace {
    /// Create the workspace and seed it with the existing credential store
    pub async fn acquire(locations: &CredentialLocations) -> DockyardResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("dockyard-")
            .tempdir()
            .map_err(|e| DockyardError::workspace("creating temporary directory", e))?;
        let path = dir.path().to_path_buf();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(&path, perms)
                .map_err(|e| DockyardError::workspace("setting workspace permissions", e))?;
        }

        let workspace = Self {
            dir: Some(dir),
            path,
        };

        if let Some(source) = locations.find_config_file() {
            workspace.seed_from(&source).await?;
        }

        debug!("Acquired build workspace {}", workspace.path.display());
        Ok(workspace)
    }

    async fn seed_from(&self, source: &Path) -> DockyardResult<()> {
        let target = self.path.join(CONFIG_FILE);
        fs::copy(source, &target).await.map_err(|e| {
            DockyardError::workspace(format!("copying {}", source.display()), e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&target, perms)
                .map_err(|e| DockyardError::workspace("setting credential file permissions", e))?;
        }

        debug!("Seeded workspace from {}", source.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn env_override(&self) -> EnvOverride {
        EnvOverride {
            key: DOCKER_CONFIG_ENV,
            value: self.path.clone(),
        }
    }

    /// Remove the workspace directory
    pub fn release(mut self) -> DockyardResult<()> {
        if let Some(dir) = self.dir.take() {
            dir.close().map_err(|e| DockyardError::WorkspaceCleanup {
                path: self.path.clone(),
                source: e,
            })?;
            debug!("Released build workspace {}", self.path.display());
        }
        Ok(())
    }
}
