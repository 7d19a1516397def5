//! `docker pull` / `docker build` command construction

use crate::docker::escape::shell_quote;
use std::path::{Path, PathBuf};

/// Everything needed to build one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    /// Directory used as build context
    pub source_directory: PathBuf,
    /// Dockerfile path relative to the source directory
    pub dockerfile: PathBuf,
    pub tag: String,
    /// Image whose layers seed the build cache
    pub cache_from: Option<String>,
}

/// Builds the cache pull and build commands
#[derive(Debug, Clone)]
pub struct BuildCommandBuilder {
    binary: String,
}

impl BuildCommandBuilder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Commands for `spec`, in execution order.
    ///
    /// A failed cache pull does not stop the sequence; the image may not
    /// exist yet on a first build.
    pub fn build(&self, spec: &BuildSpec) -> Vec<String> {
        let mut commands = Vec::with_capacity(2);

        let mut build = format!(
            "cd {} && {} build -f {} -t {} .",
            quote_path(&spec.source_directory),
            self.binary,
            quote_path(&spec.dockerfile),
            shell_quote(&spec.tag)
        );

        if let Some(cache_from) = &spec.cache_from {
            let image = shell_quote(cache_from);
            commands.push(format!("{} pull {} || true", self.binary, image));
            build.push_str(" --cache-from ");
            build.push_str(&image);
        }

        commands.push(build);
        commands
    }
}

impl Default for BuildCommandBuilder {
    fn default() -> Self {
        Self::new("docker")
    }
}

fn quote_path(path: &Path) -> String {
    shell_quote(&path.to_string_lossy())
}
