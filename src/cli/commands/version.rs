//! Version command - report what the version probe sees

use crate::config::Config;
use crate::docker::{VersionDescriptor, VersionProbe};
use crate::error::DockyardResult;
use console::style;
use std::time::Duration;

/// Execute the version command
pub async fn execute(config: &Config) -> DockyardResult<()> {
    let probe = VersionProbe::for_binary(
        &config.docker.binary,
        Duration::from_millis(config.docker.version_timeout_ms),
    );
    let version = probe.detect().await;

    match version {
        VersionDescriptor::Known { major } => {
            println!("{} {} major version {}", style("✓").green(), config.docker.binary, major)
        }
        VersionDescriptor::Unknown => println!(
            "{} {} version unknown",
            style("!").yellow(),
            config.docker.binary
        ),
    }

    let form = if version.requires_email() {
        "with --email"
    } else {
        "without --email"
    };
    println!("  Login commands are generated {}", form);

    Ok(())
}
