//! Build tool version detection
//!
//! The probe runs `docker -v` under a time limit and caches the major
//! version on success. Failures are never cached, so a later build may
//! pick up a tool that was installed or restarted in the meantime.

use crate::error::{DockyardError, DockyardResult};
use async_trait::async_trait;
use semver::Version;
use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

/// First major release whose `docker login` no longer takes `--email`.
pub const EMAIL_FLAG_REMOVED_IN: u64 = 17;

/// Detected version of the build tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionDescriptor {
    Known { major: u64 },
    Unknown,
}

impl VersionDescriptor {
    /// Whether `docker login` must be given an explicit email.
    ///
    /// Unknown versions get the older command form.
    pub fn requires_email(&self) -> bool {
        match self {
            Self::Known { major } => *major < EMAIL_FLAG_REMOVED_IN,
            Self::Unknown => true,
        }
    }
}

impl fmt::Display for VersionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known { major } => write!(f, "{}", major),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Source of the raw version string
#[async_trait]
pub trait VersionReader: Send + Sync {
    /// Return the tool's version output, e.g. `Docker version 24.0.7, build afdd53b`
    async fn read_version(&self) -> DockyardResult<String>;
}

/// Reads the version from the installed CLI
pub struct CliVersionReader {
    binary: String,
}

impl CliVersionReader {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl VersionReader for CliVersionReader {
    async fn read_version(&self) -> DockyardResult<String> {
        let output = Command::new(&self.binary)
            .arg("-v")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DockyardError::command_failed(format!("{} -v", self.binary), e))?;

        if !output.status.success() {
            return Err(DockyardError::Internal(format!(
                "{} -v exited with {}",
                self.binary, output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Extract the first `MAJOR.MINOR.PATCH` token from version output.
///
/// Docker's calendar versions carry leading zeros (`17.03.1-ce`) which
/// strict semver rejects, so components are parsed individually.
pub fn parse_version(output: &str) -> Option<Version> {
    output
        .split(|c: char| c.is_whitespace() || c == ',')
        .find_map(parse_triple)
}

fn parse_triple(token: &str) -> Option<Version> {
    let token = token.trim_start_matches('v');
    let mut parts = token.splitn(3, '.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch: String = parts.next()?.chars().take_while(|c| c.is_ascii_digit()).collect();
    let patch = patch.parse().ok()?;
    Some(Version::new(major, minor, patch))
}

/// Shared cache for the detected major version
#[derive(Debug, Default)]
pub struct VersionCache {
    major: Mutex<Option<u64>>,
}

impl VersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently cached major version, if any
    pub async fn cached(&self) -> Option<u64> {
        *self.major.lock().await
    }

    /// Forget the cached version so the next detection probes again
    pub async fn invalidate(&self) {
        *self.major.lock().await = None;
    }
}

/// Bounded-time version probe backed by a shared cache
pub struct VersionProbe {
    reader: Arc<dyn VersionReader>,
    cache: Arc<VersionCache>,
    timeout: Duration,
}

impl VersionProbe {
    pub fn new(reader: Arc<dyn VersionReader>, cache: Arc<VersionCache>, timeout: Duration) -> Self {
        Self {
            reader,
            cache,
            timeout,
        }
    }

    /// Probe the installed CLI
    pub fn for_binary(binary: &str, timeout: Duration) -> Self {
        Self::new(
            Arc::new(CliVersionReader::new(binary)),
            Arc::new(VersionCache::new()),
            timeout,
        )
    }

    pub fn cache(&self) -> &Arc<VersionCache> {
        &self.cache
    }

    /// Detect the build tool version.
    ///
    /// Concurrent callers serialize on the cache lock, so at most one probe
    /// runs at a time and every caller after the first success sees it.
    pub async fn detect(&self) -> VersionDescriptor {
        let mut cached = self.cache.major.lock().await;
        if let Some(major) = *cached {
            return VersionDescriptor::Known { major };
        }

        let output = match tokio::time::timeout(self.timeout, self.reader.read_version()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!("Version probe failed: {}", e);
                return VersionDescriptor::Unknown;
            }
            Err(_) => {
                debug!("Version probe timed out after {:?}", self.timeout);
                return VersionDescriptor::Unknown;
            }
        };

        match parse_version(&output) {
            Some(version) => {
                debug!("Detected build tool version {}", version);
                *cached = Some(version.major);
                VersionDescriptor::Known {
                    major: version.major,
                }
            }
            None => {
                debug!("Unrecognized version output: {:?}", output);
                VersionDescriptor::Unknown
            }
        }
    }
}
