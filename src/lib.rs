//! spacetraveling: a blog renderer backed by the Prismic headless CMS
//!
//! Posts are fetched from the content API, normalized into view models and
//! rendered with embedded Tera templates, either ahead of time into a public
//! directory or on demand by a server that keeps each page for a
//! revalidation window.

pub mod cache;
pub mod client;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod pages;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use client::{ContentClient, PrismicClient};
use helpers::DateFormatter;

/// The blog application: configuration plus the injected content client
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Client every controller reads content through
    pub client: Arc<dyn ContentClient>,
    /// Formatter for publication dates
    pub dates: DateFormatter,
}

impl Blog {
    /// Create a blog from a directory, talking to the configured Prismic repository
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config = Self::load_config(base_dir.as_ref())?;
        let client = PrismicClient::from_config(&config)?;
        Self::with_client(base_dir, config, Arc::new(client))
    }

    /// Create a blog with an explicitly provided client
    pub fn with_client<P: AsRef<Path>>(
        base_dir: P,
        config: config::SiteConfig,
        client: Arc<dyn ContentClient>,
    ) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        let dates = DateFormatter::from_timezone_name(&config.timezone)?;

        Ok(Self {
            config,
            base_dir,
            public_dir,
            client,
            dates,
        })
    }

    /// Read `_config.yml` (defaults when absent) and apply environment overrides
    pub fn load_config(base_dir: &Path) -> Result<config::SiteConfig> {
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Pre-render the site into the public directory
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
