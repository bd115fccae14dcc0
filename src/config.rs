use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_CAPACITY;
use crate::catalog::{Catalog, CatalogError};
use crate::fetcher::DEFAULT_TIMEOUT;

pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Parser, Debug)]
#[command(version, about = "Angular and web development documentation MCP server (stdio)")]
pub struct Cli {
    /// Timeout in seconds for each documentation fetch
    #[arg(
        long,
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Maximum number of cached documents
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub cache_capacity: usize,

    /// JSON file replacing the built-in resource catalog
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// User-Agent header sent with every fetch
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Runtime configuration, fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub timeout: Duration,
    pub cache_capacity: usize,
    pub catalog_path: Option<PathBuf>,
    pub user_agent: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            cache_capacity: DEFAULT_CAPACITY,
            catalog_path: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            timeout: Duration::from_secs(cli.timeout_secs),
            cache_capacity: cli.cache_capacity,
            catalog_path: cli.catalog,
            user_agent: cli.user_agent,
            log_level: cli.log_level,
        }
    }
}

impl Config {
    /// The catalog file if one was given, otherwise the built-in catalog.
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => Catalog::from_file(path),
            None => Ok(Catalog::default()),
        }
    }
}
