//! Site configuration management for `folio.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[base]`    | Site metadata (title, author, url)               |
//! | `[build]`   | Paths, slugs, markdown options, feed and index   |
//! | `[extra]`   | User-defined custom fields                       |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "Performance Notes"
//! url = "https://notes.example.com"
//!
//! [build]
//! content = "_posts"
//! output = "public"
//!
//! [build.feed]
//! enable = true
//! ```

mod base;
mod build;
pub mod defaults;
mod error;

pub use build::SlugMode;

use base::BaseConfig;
use build::BuildConfig;
use error::ConfigError;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing folio.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());
        self.config_path = cli.config.clone();
        self.update_path_with_root(&root);

        match &cli.command {
            Commands::Build { build_args } => {
                self.build.clean |= build_args.clean;
                self.build.drafts |= build_args.drafts;
                Self::update_option(&mut self.build.minify, build_args.minify.as_ref());
                Self::update_option(&mut self.build.feed.enable, build_args.feed.as_ref());
                if let Some(url) = &build_args.base_url {
                    self.base.url = Some(url.clone());
                }
            }
            Commands::Check { drafts } => {
                self.build.drafts |= *drafts;
            }
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    pub fn update_path_with_root(&mut self, root: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        if !self.config_path.as_os_str().is_empty() {
            self.config_path = Self::normalize_path(&root.join(&self.config_path));
        }
        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.build.includes = Self::normalize_path(&root.join(&self.build.includes));
        self.build.layouts = Self::normalize_path(&root.join(&self.build.layouts));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before running the pipeline
    pub fn validate(&self) -> Result<()> {
        if !self.config_path.exists() {
            bail!("Config file not found");
        }

        let build = &self.build;
        if !build.content.is_dir() {
            bail!(ConfigError::ContentNotDir(build.content.clone()));
        }
        if build.extensions.is_empty() {
            bail!(ConfigError::NoExtensions);
        }

        match &self.base.url {
            Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                bail!(ConfigError::InvalidUrl(url.clone()));
            }
            None if build.feed.enable => bail!(ConfigError::FeedWithoutUrl),
            _ => {}
        }

        if build.output.starts_with(&build.content) {
            bail!(ConfigError::OutputInsideContent {
                output: build.output.clone(),
                content: build.content.clone(),
            });
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
