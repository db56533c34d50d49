//! HTTP fetcher for downloading source filter lists.
//!
//! Fetching happens entirely before the engine runs. Each source is
//! downloaded with retries and exponential backoff, size-capped, and cached
//! on disk; a fetch failure falls back to an expired cache entry when one
//! exists. Sources that still fail are absent from the engine input.

use anyhow::{Context, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use crate::config::{Settings, SourceConfig};

/// Maximum size per source list (20 MB). EasyList is ~2.5 MB, so this
/// leaves ample margin.
const MAX_LIST_SIZE: usize = 20 * 1024 * 1024;

/// Maximum total size for all downloads combined (100 MB).
const MAX_TOTAL_SIZE: usize = 100 * 1024 * 1024;

/// Result of fetching one source list.
#[derive(Debug)]
pub struct FetchResult {
    pub name: String,
    pub lines: Vec<String>,
    pub from_cache: bool,
}

/// HTTP client for fetching source lists, with an on-disk cache.
pub struct Fetcher {
    client: Client,
    cache_dir: PathBuf,
    use_cache: bool,
    cache_ttl: Duration,
    max_retries: u32,
    retry_delay: Duration,
    parallel_downloads: usize,
    /// Cumulative download size tracker (thread-safe for concurrent fetches)
    total_downloaded: AtomicUsize,
}

impl Fetcher {
    pub fn new(settings: &Settings, cache_dir: impl Into<PathBuf>, use_cache: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout))
            .user_agent(settings.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        let cache_dir = cache_dir.into();
        if use_cache {
            std::fs::create_dir_all(&cache_dir)
                .with_context(|| format!("Failed to create cache directory: {:?}", cache_dir))?;
        }

        Ok(Self {
            client,
            cache_dir,
            use_cache,
            cache_ttl: Duration::from_secs(settings.cache_ttl),
            max_retries: settings.max_retries.max(1),
            retry_delay: Duration::from_secs(settings.retry_delay),
            parallel_downloads: settings.parallel_downloads.max(1),
            total_downloaded: AtomicUsize::new(0),
        })
    }

    /// Fetch one source, preferring a fresh cache entry over the network.
    pub async fn fetch_source(&self, source: &SourceConfig) -> Result<FetchResult> {
        let cache_file = self.cache_path(&source.name);

        if self.use_cache && self.cache_valid(&cache_file) {
            debug!("Using cached copy of {}", source.name);
            let lines = load_cache(&cache_file)?;
            return Ok(FetchResult {
                name: source.name.clone(),
                lines,
                from_cache: true,
            });
        }

        info!("Fetching {}...", source.name);
        match self.fetch_with_retry(&source.url).await {
            Ok(content) => {
                let lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
                info!("Fetched {} - {} lines", source.name, lines.len());
                if self.use_cache {
                    if let Err(e) = save_cache(&cache_file, &lines) {
                        warn!("Failed to cache {}: {}", source.name, e);
                    }
                }
                Ok(FetchResult {
                    name: source.name.clone(),
                    lines,
                    from_cache: false,
                })
            }
            Err(e) => {
                // Stale cache beats no data at all
                if self.use_cache && cache_file.exists() {
                    warn!(
                        "Fetch of {} failed ({}); using expired cache",
                        source.name, e
                    );
                    let lines = load_cache(&cache_file)?;
                    return Ok(FetchResult {
                        name: source.name.clone(),
                        lines,
                        from_cache: true,
                    });
                }
                Err(e.context(format!("Failed to fetch {}", source.name)))
            }
        }
    }

    /// Fetch all sources concurrently with bounded parallelism.
    ///
    /// Results are keyed by name because completion order is not arrival
    /// order; the caller reassembles them in configured priority order.
    pub async fn fetch_sources(
        &self,
        sources: &[&SourceConfig],
    ) -> Vec<(String, Result<FetchResult>)> {
        use futures::stream::{self, StreamExt};

        stream::iter(sources.iter().map(|source| async move {
            (source.name.clone(), self.fetch_source(source).await)
        }))
        .buffer_unordered(self.parallel_downloads)
        .collect()
        .await
    }

    /// Fetch content with retry logic, backoff, and size validation.
    async fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = self.retry_delay * (1 << (attempt - 1));
                debug!("Retry {} after {:?} for {}", attempt, delay, url);
                tokio::time::sleep(delay).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        if let Some(content_length) = response.content_length() {
                            if content_length as usize > MAX_LIST_SIZE {
                                return Err(anyhow::anyhow!(
                                    "Response too large: {} bytes (max: {} bytes)",
                                    content_length,
                                    MAX_LIST_SIZE
                                ));
                            }
                        }

                        let body = response
                            .text()
                            .await
                            .context("Failed to read response body")?;

                        if body.len() > MAX_LIST_SIZE {
                            return Err(anyhow::anyhow!(
                                "Downloaded content too large: {} bytes (max: {} bytes)",
                                body.len(),
                                MAX_LIST_SIZE
                            ));
                        }

                        let new_total = self
                            .total_downloaded
                            .fetch_add(body.len(), Ordering::Relaxed)
                            + body.len();
                        if new_total > MAX_TOTAL_SIZE {
                            return Err(anyhow::anyhow!(
                                "Cumulative download limit exceeded: {} bytes (max: {} bytes)",
                                new_total,
                                MAX_TOTAL_SIZE
                            ));
                        }

                        return Ok(body);
                    }
                    last_error = Some(anyhow::anyhow!("HTTP {}", response.status()));
                }
                Err(e) => {
                    last_error = Some(e.into());
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Unknown error")))
    }

    /// Cache file path for a source, with the name sanitized for the
    /// filesystem.
    fn cache_path(&self, source_name: &str) -> PathBuf {
        let safe_name: String = source_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.cache_dir.join(format!("{}.txt", safe_name))
    }

    /// A cache entry is valid while its age is below the configured TTL.
    fn cache_valid(&self, cache_file: &Path) -> bool {
        let Ok(metadata) = std::fs::metadata(cache_file) else {
            return false;
        };
        let Ok(modified) = metadata.modified() else {
            return false;
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age < self.cache_ttl,
            // Clock skew: a cache entry from the future is treated as fresh
            Err(_) => true,
        }
    }

    /// Remove all cached source lists.
    pub fn clean_cache(&self) -> Result<usize> {
        let mut removed = 0;
        if !self.cache_dir.exists() {
            return Ok(0);
        }
        for entry in std::fs::read_dir(&self.cache_dir)
            .with_context(|| format!("Failed to read cache directory: {:?}", self.cache_dir))?
        {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "txt") {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove cache file: {:?}", path))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn load_cache(cache_file: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(cache_file)
        .with_context(|| format!("Failed to load cache file: {:?}", cache_file))?;
    Ok(content.lines().map(|l| l.to_string()).collect())
}

fn save_cache(cache_file: &Path, lines: &[String]) -> Result<()> {
    std::fs::write(cache_file, lines.join("\n"))
        .with_context(|| format!("Failed to write cache file: {:?}", cache_file))?;
    Ok(())
}
