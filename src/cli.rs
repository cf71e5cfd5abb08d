//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Folio static publisher CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Content directory path (relative to project root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Config file name (default: folio.toml)
    #[arg(short = 'C', long, default_value = "folio.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Build arguments
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Clean output directory completely before writing
    #[arg(long)]
    pub clean: bool,

    /// Publish documents marked as drafts
    #[arg(long)]
    pub drafts: bool,

    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// enable rss feed generation
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub feed: Option<bool>,

    /// Override base URL for the site.
    ///
    /// Useful for CI builds where the production URL differs from the one in folio.toml.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Load, resolve and render every document, then publish the batch
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Run the whole pipeline without writing anything and report problems
    Check {
        /// Include documents marked as drafts
        #[arg(long)]
        drafts: bool,
    },
}

impl Cli {
    pub const fn is_check(&self) -> bool {
        matches!(self.command, Commands::Check { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_with_flags() {
        let cli = Cli::try_parse_from([
            "folio", "-r", "site", "build", "--clean", "--drafts", "-m", "false", "--feed",
        ])
        .unwrap();

        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.config, PathBuf::from("folio.toml"));
        let Commands::Build { build_args } = cli.command else {
            panic!("expected build command");
        };
        assert!(build_args.clean);
        assert!(build_args.drafts);
        assert_eq!(build_args.minify, Some(false));
        assert_eq!(build_args.feed, Some(true));
        assert_eq!(build_args.base_url, None);
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["folio", "-C", "site.toml", "check"]).unwrap();
        assert!(cli.is_check());
        assert_eq!(cli.config, PathBuf::from("site.toml"));
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["folio"]).is_err());
    }
}
