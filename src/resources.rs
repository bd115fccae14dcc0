use futures::future::join_all;
use std::sync::Arc;

use crate::cache::{Cache, daily_key};
use crate::clock::Clock;
use crate::fetcher::{FetchError, HttpFetcher};

/// Result of fetching one URL as part of a fan-out.
#[derive(Debug)]
pub struct FetchOutcome {
    pub url: String,
    pub result: Result<String, FetchError>,
}

/// Per-URL outcomes of a fan-out fetch, in the order the URLs were given.
#[derive(Debug)]
pub struct FetchReport {
    outcomes: Vec<FetchOutcome>,
}

impl FetchReport {
    #[allow(dead_code)]
    pub fn outcomes(&self) -> &[FetchOutcome] {
        &self.outcomes
    }

    #[allow(dead_code)]
    pub fn failures(&self) -> impl Iterator<Item = &FetchOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// All-or-nothing assembly: every body in URL order, or the first
    /// failure in URL order.
    pub fn into_all(self) -> Result<Vec<String>, FetchError> {
        self.outcomes.into_iter().map(|o| o.result).collect()
    }
}

/// Fetches resources through a cache.
///
/// A hit returns the stored body without touching the network. A miss fetches
/// once and stores the body only when the fetch succeeded; failures are never
/// cached and never retried.
#[derive(Clone)]
pub struct CachedFetcher {
    fetcher: HttpFetcher,
    cache: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
}

impl CachedFetcher {
    pub fn new(fetcher: HttpFetcher, cache: Arc<dyn Cache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            cache,
            clock,
        }
    }

    #[allow(dead_code)]
    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    /// The key a URL is cached under when the caller supplies none.
    pub fn default_key(&self, url: &str) -> String {
        daily_key(url, self.clock.today())
    }

    pub async fn fetch(&self, url: &str, cache_key: Option<&str>) -> Result<String, FetchError> {
        let key = match cache_key {
            Some(key) => key.to_string(),
            None => self.default_key(url),
        };

        if let Some(body) = self.cache.get(&key).await {
            tracing::info!("Cache hit for {}", key);
            return Ok(body);
        }

        tracing::info!("Cache miss for {}. Fetching...", key);
        match self.fetcher.fetch(url).await {
            Ok(body) => {
                self.cache.insert(key, body.clone()).await;
                Ok(body)
            }
            Err(err) => {
                tracing::warn!("Failed to fetch {}: {}", url, err);
                Err(err)
            }
        }
    }

    /// Fetches every URL concurrently under its default key and reports each
    /// outcome.
    pub async fn fetch_each(&self, urls: &[String]) -> FetchReport {
        let results = join_all(urls.iter().map(|url| self.fetch(url, None))).await;
        let outcomes = urls
            .iter()
            .cloned()
            .zip(results)
            .map(|(url, result)| FetchOutcome { url, result })
            .collect();
        FetchReport { outcomes }
    }
}
