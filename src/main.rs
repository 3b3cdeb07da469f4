//! CLI entry point for minimap grid extraction

use std::process::ExitCode;

use clap::Parser;
use dfmap::io::cli::{BatchProcessor, Cli};

fn main() -> dfmap::Result<ExitCode> {
    let cli = Cli::parse();
    let default_filter = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut processor = BatchProcessor::new(cli);
    let report = processor.process()?;
    if report.has_failures() {
        log::warn!(
            "{} worlds failed, {} worlds had failed elevations",
            report.world_failures.len(),
            report.worlds.iter().filter(|w| !w.is_complete()).count()
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
