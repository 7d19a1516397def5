//! Registries command - list registries a build would log into

use crate::cli::args::RegistriesArgs;
use crate::config::Config;
use crate::error::DockyardResult;
use crate::registry::{ConfiguredRegistries, RegistryCredential, RegistrySource};
use console::style;
use serde::Serialize;

/// Registry entry as shown to users; never includes the password
#[derive(Debug, Serialize)]
struct RegistryEntry<'a> {
    host: &'a str,
    username: &'a str,
}

impl<'a> From<&'a RegistryCredential> for RegistryEntry<'a> {
    fn from(cred: &'a RegistryCredential) -> Self {
        Self {
            host: &cred.host,
            username: &cred.username,
        }
    }
}

/// Execute the registries command
pub async fn execute(args: RegistriesArgs, config: &Config) -> DockyardResult<()> {
    let registries = ConfiguredRegistries::from_config(&config.registries)
        .all()
        .await?;

    if args.json {
        let entries: Vec<RegistryEntry> = registries.iter().map(RegistryEntry::from).collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if registries.is_empty() {
        println!("{}", style("No registries configured").dim());
        return Ok(());
    }

    println!("{:<40} {}", style("HOST").bold(), style("USERNAME").bold());
    for cred in &registries {
        println!("{:<40} {}", cred.host, cred.username);
    }

    Ok(())
}
