use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::cache::{Cache, InMemoryCache};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::fetcher::HttpFetcher;
use crate::resources::CachedFetcher;
use crate::tools::{AngularSources, DocTools};
use crate::transport;

/// Written once to stderr when the server starts.
pub const STARTUP_NOTICE: &str = "Angular Docs MCP server running on stdio";

// Logs go to stderr; stdout carries protocol responses only.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

/// Builds the dispatcher and its collaborators from `config`.
pub fn build_dispatcher(config: &Config) -> Result<Dispatcher> {
    let catalog = config.load_catalog().with_context(|| match &config.catalog_path {
        Some(path) => format!("Failed to load catalog from {}", path.display()),
        None => "Failed to load built-in catalog".to_string(),
    })?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new(config.cache_capacity, clock.clone()));
    let fetcher = HttpFetcher::with_user_agent(&config.user_agent, config.timeout)
        .context("Failed to build HTTP client")?;

    let tools = DocTools::new(
        CachedFetcher::new(fetcher, cache, clock),
        Arc::new(catalog),
        AngularSources::default(),
    );
    Ok(Dispatcher::new(tools))
}

// start stdio server
pub async fn start_stdio_server(config: Config) -> Result<()> {
    init_logging(&config.log_level);

    let dispatcher = build_dispatcher(&config).inspect_err(|e| {
        tracing::error!("Failed to start server: {:?}", e);
    })?;
    tracing::info!(
        "Starting MCP server (timeout {:?}, cache capacity {})",
        config.timeout,
        config.cache_capacity
    );
    eprintln!("{}", STARTUP_NOTICE);

    transport::serve(tokio::io::stdin(), tokio::io::stdout(), dispatcher)
        .await
        .context("stdio transport failed")?;

    tracing::info!("MCP server stopped");
    Ok(())
}
