//! Image build orchestrator

use crate::config::Config;
use crate::docker::{BuildCommandBuilder, BuildSpec, LoginCommandBuilder, VersionProbe};
use crate::error::{DockyardError, DockyardResult};
use crate::orchestration::executor::{ProcessExecutor, ShellExecutor};
use crate::registry::{ConfiguredRegistries, RegistryCredential, RegistrySource};
use crate::workspace::{CredentialLocations, EnvOverride, ScopedWorkspace};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWrite;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Caller-supplied build parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub dockerfile: PathBuf,
    pub tag: String,
    pub cache_from: Option<String>,
}

impl BuildOptions {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            dockerfile: PathBuf::from("Dockerfile"),
            tag: tag.into(),
            cache_from: None,
        }
    }

    pub fn dockerfile(mut self, dockerfile: impl Into<PathBuf>) -> Self {
        self.dockerfile = dockerfile.into();
        self
    }

    pub fn cache_from(mut self, image: impl Into<String>) -> Self {
        self.cache_from = Some(image.into());
        self
    }
}

/// Lifecycle of a single build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    StagingCredentials,
    Executing,
    Done { success: bool },
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::StagingCredentials => write!(f, "staging-credentials"),
            Self::Executing => write!(f, "executing"),
            Self::Done { success: true } => write!(f, "done (success)"),
            Self::Done { success: false } => write!(f, "done (failure)"),
        }
    }
}

fn transition(state: &mut BuildState, next: BuildState) {
    debug!("Build state {} -> {}", state, next);
    *state = next;
}

/// Terminal state for an executor outcome; an executor error is a failure.
fn finished(result: &DockyardResult<bool>) -> BuildState {
    BuildState::Done {
        success: matches!(result, Ok(true)),
    }
}

/// Coordinates registry logins and the image build.
///
/// Holds no per-build state; one orchestrator can serve concurrent builds,
/// each of which gets its own workspace. The version probe is shared.
pub struct BuildOrchestrator {
    registries: Arc<dyn RegistrySource>,
    executor: Arc<dyn ProcessExecutor>,
    probe: Arc<VersionProbe>,
    login: LoginCommandBuilder,
    build: BuildCommandBuilder,
    locations: CredentialLocations,
}

impl BuildOrchestrator {
    pub fn new(
        registries: Arc<dyn RegistrySource>,
        executor: Arc<dyn ProcessExecutor>,
        probe: Arc<VersionProbe>,
    ) -> Self {
        Self {
            registries,
            executor,
            probe,
            login: LoginCommandBuilder::default(),
            build: BuildCommandBuilder::default(),
            locations: CredentialLocations::from_env(),
        }
    }

    /// Orchestrator wired to the real shell, CLI and configured registries
    pub fn from_config(config: &Config) -> Self {
        let docker = &config.docker;
        let probe = VersionProbe::for_binary(
            &docker.binary,
            Duration::from_millis(docker.version_timeout_ms),
        );

        Self::new(
            Arc::new(ConfiguredRegistries::from_config(&config.registries)),
            Arc::new(ShellExecutor::from_config(&config.executor)),
            Arc::new(probe),
        )
        .with_commands(
            LoginCommandBuilder::new(docker.binary.clone(), docker.placeholder_email.clone()),
            BuildCommandBuilder::new(docker.binary.clone()),
        )
    }

    pub fn with_commands(mut self, login: LoginCommandBuilder, build: BuildCommandBuilder) -> Self {
        self.login = login;
        self.build = build;
        self
    }

    /// Look for an existing credential store in `locations` instead of the environment
    pub fn with_locations(mut self, locations: CredentialLocations) -> Self {
        self.locations = locations;
        self
    }

    /// Workspace export followed by one login per registry
    pub async fn login_commands(
        &self,
        env: &EnvOverride,
        credentials: &[RegistryCredential],
    ) -> Vec<String> {
        let version = self.probe.detect().await;
        debug!("Using login syntax for build tool version {}", version);

        let mut commands = Vec::with_capacity(credentials.len() + 1);
        commands.push(env.export_command());
        commands.extend(credentials.iter().map(|c| self.login.build(c, version)));
        commands
    }

    /// Build an image from `source_directory`, streaming output into `sink`.
    ///
    /// Returns whether every command succeeded. The workspace is removed
    /// before returning, whatever the outcome.
    pub async fn build_image(
        &self,
        source_directory: &Path,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        options: BuildOptions,
    ) -> DockyardResult<bool> {
        let build_id = Uuid::new_v4();
        let span = tracing::info_span!("build", id = %build_id, tag = %options.tag);
        self.run_build(source_directory, sink, options)
            .instrument(span)
            .await
    }

    async fn run_build(
        &self,
        source_directory: &Path,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
        options: BuildOptions,
    ) -> DockyardResult<bool> {
        let mut state = BuildState::Idle;

        if !source_directory.is_dir() {
            return Err(DockyardError::SourceNotFound(source_directory.to_path_buf()));
        }

        let spec = BuildSpec {
            source_directory: source_directory.to_path_buf(),
            dockerfile: options.dockerfile,
            tag: options.tag,
            cache_from: options.cache_from,
        };

        transition(&mut state, BuildState::StagingCredentials);
        let credentials = self.registries.all().await?;
        for credential in &credentials {
            credential.validate()?;
        }
        let workspace = ScopedWorkspace::acquire(&self.locations).await?;

        let mut commands = self
            .login_commands(&workspace.env_override(), &credentials)
            .await;
        commands.extend(self.build.build(&spec));

        info!(
            "Building {} with {} registry logins",
            spec.tag,
            credentials.len()
        );
        transition(&mut state, BuildState::Executing);
        let result = self.executor.execute(&commands, sink).await;

        if let Err(e) = workspace.release() {
            warn!("{}", e);
        }

        transition(&mut state, finished(&result));
        let success = result?;
        if success {
            info!("Built {}", spec.tag);
        } else {
            warn!("Build of {} failed", spec.tag);
        }
        Ok(success)
    }
}
