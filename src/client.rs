use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::blacklist::Blacklist;
use crate::cache::{normalize_query, SearchCache, StoreStats, VideoCache};
use crate::config::RelayConfig;
use crate::directory::InstanceDirectory;
use crate::error::{RelayError, Result};
use crate::executor::RequestExecutor;
use crate::models::{SearchResult, Video};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Read-through client for the Invidious API.
///
/// Keeps one current instance, rotates to another one from the public
/// directory whenever a call against it fails for a reason other than a
/// 404, and caches videos and search results. Share it as `Arc<RelayClient>`;
/// independent clients share nothing.
pub struct RelayClient {
    executor: RequestExecutor,
    directory: InstanceDirectory,
    blacklist: Blacklist,
    videos: VideoCache,
    search: SearchCache,
    current_instance: RwLock<Option<String>>,
    config: RelayConfig,
}

impl RelayClient {
    /// Client backed by `reqwest`. Does not touch the network: the first
    /// call resolves an instance when no default one is configured.
    pub fn new(config: RelayConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout, &config.user_agent)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: RelayConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let current = config
            .default_instance
            .as_deref()
            .map(instance_host)
            .filter(|host| !host.is_empty())
            .map(str::to_string);

        if let Some(instance) = &current {
            info!(instance = %instance, "using default instance");
        }

        Self {
            executor: RequestExecutor::new(transport.clone(), config.api_version.clone()),
            directory: InstanceDirectory::new(transport, config.directory_url.clone()),
            blacklist: Blacklist::new(config.blacklist_cooldown),
            videos: VideoCache::new(config.video_ttl),
            search: SearchCache::new(config.search_ttl),
            current_instance: RwLock::new(current),
            config,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn current_instance(&self) -> Option<String> {
        self.current_instance.read().clone()
    }

    /// Video metadata, served from cache while its stream URLs are valid.
    pub async fn get_video(&self, video_id: &str) -> Result<Video> {
        debug!(video_id, "video https://youtu.be/{} was requested", video_id);

        if let Ok(video) = self.videos.get(video_id) {
            debug!(video_id, "found a valid cache entry");
            return Ok(video);
        }

        let path = format!("videos/{}", urlencoding::encode(video_id));
        let resource = format!("video {video_id}");
        let (path, resource) = (path.as_str(), resource.as_str());
        let video: Video = self
            .with_failover(resource, move |instance| async move {
                self.executor.get_json(&instance, path, resource).await
            })
            .await?;

        debug!(video_id, "retrieved by API");
        self.videos
            .insert_video(video_id.to_string(), video.clone(), self.config.video_ttl);

        Ok(video)
    }

    /// Drops any cached record first, forcing an upstream round trip.
    pub async fn get_video_no_cache(&self, video_id: &str) -> Result<Video> {
        self.videos.delete(video_id);
        self.get_video(video_id).await
    }

    /// Search results for `query`; `"  Foo Bar "` and `"foo bar"` share a
    /// cache entry.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let q = normalize_query(query);

        if let Ok(results) = self.search.get(&q) {
            debug!(query = %q, "search served from cache");
            return Ok(results);
        }

        let path = format!("search?q={}", urlencoding::encode(&q));
        let resource = format!("search results for {q:?}");
        let (path, resource) = (path.as_str(), resource.as_str());
        let results: Vec<SearchResult> = self
            .with_failover(resource, move |instance| async move {
                self.executor.get_json(&instance, path, resource).await
            })
            .await?;

        debug!(query = %q, count = results.len(), "search retrieved by API");
        self.search.insert(q, results.clone());

        Ok(results)
    }

    /// Raw caption track with the given label. Never cached.
    pub async fn get_captions(&self, video_id: &str, label: &str) -> Result<Bytes> {
        let path = format!(
            "captions/{}?label={}",
            urlencoding::encode(video_id),
            urlencoding::encode(label)
        );
        let resource = format!("captions {label:?} for video {video_id}");
        let (path, resource) = (path.as_str(), resource.as_str());

        self.with_failover(resource, move |instance| async move {
            self.executor.get_bytes(&instance, path, resource).await
        })
        .await
    }

    /// Abandons the current instance (if any) and selects a new one.
    pub async fn new_instance(&self) -> Result<String> {
        match self.current_instance() {
            Some(current) => self.rotate_away_from(&current, "rotation requested").await,
            None => self.resolve_instance().await,
        }
    }

    /// Excludes `instance` for the configured cooldown.
    pub fn report_failure(&self, instance: &str, reason: &str) {
        self.blacklist.report(instance, reason);
    }

    pub fn blacklisted_instances(&self) -> Vec<String> {
        self.blacklist.instances()
    }

    pub fn is_blacklisted(&self, instance: &str) -> bool {
        self.blacklist.contains(instance)
    }

    /// Unexpired cached videos by id.
    pub fn cached_videos(&self) -> HashMap<String, Video> {
        self.videos.snapshot().into_iter().collect()
    }

    pub fn video_cache_stats(&self) -> StoreStats {
        self.videos.stats()
    }

    pub fn search_cache_stats(&self) -> StoreStats {
        self.search.stats()
    }

    /// Sweeps expired entries from every store, returning how many went.
    pub fn purge_expired(&self) -> usize {
        let removed =
            self.videos.purge_expired() + self.search.purge_expired() + self.blacklist.purge_expired();
        if removed > 0 {
            info!(removed, "cache cleanup: removed expired entries");
        }
        removed
    }

    async fn ensure_instance(&self) -> Result<String> {
        match self.current_instance() {
            Some(instance) => Ok(instance),
            None => self.resolve_instance().await,
        }
    }

    async fn resolve_instance(&self) -> Result<String> {
        let instance = self.directory.resolve(&self.blacklist).await?;
        *self.current_instance.write() = Some(instance.clone());
        info!(instance = %instance, "using new instance");
        Ok(instance)
    }

    /// Blacklists `failed` and moves on. When another caller already rotated
    /// away from it, their choice is kept.
    async fn rotate_away_from(&self, failed: &str, reason: &str) -> Result<String> {
        self.report_failure(failed, reason);

        if let Some(current) = self.current_instance() {
            if current != failed {
                debug!(instance = %current, "instance already rotated");
                return Ok(current);
            }
        }

        self.resolve_instance().await
    }

    /// Runs `request` against the current instance until it succeeds, the
    /// resource turns out not to exist, or no instance is left.
    async fn with_failover<T, F, Fut>(&self, resource: &str, mut request: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = 0usize;

        loop {
            attempts += 1;

            let (used, err) = match self.ensure_instance().await {
                Ok(instance) => match request(instance.clone()).await {
                    Ok(value) => return Ok(value),
                    Err(err) => (Some(instance), err),
                },
                Err(err) => (None, err),
            };

            if !err.is_retryable() {
                return Err(err);
            }

            warn!(
                resource,
                instance = used.as_deref().unwrap_or("none"),
                attempt = attempts,
                error = %err,
                "request failed"
            );

            if self.config.max_attempts != 0 && attempts >= self.config.max_attempts {
                error!(resource, attempts, "giving up");
                return Err(RelayError::RetriesExhausted { attempts });
            }

            // Without a used instance the directory itself failed; just back off.
            let rotation = match used {
                Some(instance) => self.rotate_away_from(&instance, &err.to_string()).await,
                None => Err(err),
            };

            match rotation {
                Ok(_) => {}
                Err(RelayError::NoValidInstance) => {
                    error!(resource, "no valid instance left");
                    return Err(RelayError::NoValidInstance);
                }
                Err(rotation_err) => {
                    error!(error = %rotation_err, backoff = ?self.config.rotation_backoff, "could not rotate instance");
                    tokio::time::sleep(self.config.rotation_backoff).await;
                }
            }
        }
    }
}

/// Host part of an instance given either as a bare host or as a URL.
fn instance_host(raw: &str) -> &str {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw);
    raw.trim_end_matches('/')
}
