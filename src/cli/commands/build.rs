//! Build command - log into registries and build an image

use crate::cli::args::BuildArgs;
use crate::config::Config;
use crate::error::DockyardResult;
use crate::orchestration::{BuildOptions, BuildOrchestrator};
use console::style;
use std::time::Instant;
use tracing::debug;

/// Execute the build command, returning whether the build succeeded
pub async fn execute(args: BuildArgs, config: &Config) -> DockyardResult<bool> {
    let orchestrator = BuildOrchestrator::from_config(config);

    let mut options = BuildOptions::new(args.tag.clone()).dockerfile(args.dockerfile);
    if let Some(cache_from) = args.cache_from {
        options = options.cache_from(cache_from);
    }

    debug!("Building {} from {}", args.tag, args.source.display());
    let started = Instant::now();
    let mut stdout = tokio::io::stdout();
    let success = orchestrator
        .build_image(&args.source, &mut stdout, options)
        .await?;

    let elapsed = started.elapsed().as_secs_f32();
    if success {
        println!(
            "{} Built {} in {:.1}s",
            style("✓").green(),
            style(&args.tag).cyan(),
            elapsed
        );
    } else {
        eprintln!(
            "{} Build of {} failed after {:.1}s",
            style("✗").red(),
            style(&args.tag).cyan(),
            elapsed
        );
    }

    Ok(success)
}
