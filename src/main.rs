//! Folio - a batch static publisher for annotated Markdown articles.

mod build;
mod cli;
mod config;
mod document;
mod error;
mod logger;
mod publish;
mod render;
mod resolve;
mod utils;

use anyhow::{Result, bail};
use build::{Mode, publish_site};
use clap::Parser;
use cli::Cli;
use config::SiteConfig;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let mode = if cli.is_check() { Mode::Check } else { Mode::Write };
    let report = publish_site(&config, mode)?;
    report.log_summary(mode);

    if report.has_failures() {
        bail!("{} document(s) failed", report.failures.len());
    }
    Ok(())
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    if !config_path.exists() {
        bail!("Config file `{}` not found.", config_path.display());
    }

    let mut config = SiteConfig::from_path(&config_path)?;
    config.update_with_cli(cli);
    config.validate()?;

    Ok(config)
}
