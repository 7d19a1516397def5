//! Build tool command lines
//!
//! Everything here produces strings for the build shell; nothing in this
//! module spawns the login or build itself. The only process started is
//! the `docker -v` version probe.

pub mod build;
pub mod escape;
pub mod login;
pub mod version;

pub use build::{BuildCommandBuilder, BuildSpec};
pub use escape::{escape, shell_quote};
pub use login::{redact_password, LoginCommandBuilder};
pub use version::{
    parse_version, CliVersionReader, VersionCache, VersionDescriptor, VersionProbe, VersionReader,
};
