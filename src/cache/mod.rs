//! # Cache Module
//!
//! Time-bounded caching for the relay client.
//!
//! Everything here is built on [`ExpiringStore`], a concurrent map whose
//! entries carry an absolute expiry. The client keeps three of them:
//!
//! - **Videos**: keyed by video id. The TTL follows the stream URLs: the
//!   first adaptive format's `expire=` timestamp decides when the record goes
//!   stale, with a fixed fallback when that is unavailable.
//! - **Search results**: keyed by the normalized query, fixed TTL.
//! - **Blacklist**: see [`crate::blacklist`].
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rabbitpipe::cache::{SearchCache, normalize_query};
//! use std::time::Duration;
//!
//! # fn example() {
//! let cache = SearchCache::new(Duration::from_secs(3 * 3600));
//!
//! cache.insert(normalize_query("  Foo Bar "), Vec::new());
//!
//! if let Ok(results) = cache.get(&normalize_query("foo bar")) {
//!     println!("{} cached results", results.len());
//! }
//! # }
//! ```

pub mod expiring;

pub use expiring::{ExpiringStore, LookupMiss, StoreStats};

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use crate::models::{SearchResult, Video};

/// Video records keyed by video id.
pub type VideoCache = ExpiringStore<String, Video>;

/// Search results keyed by [`normalize_query`].
pub type SearchCache = ExpiringStore<String, Vec<SearchResult>>;

static EXPIRE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[?&])expire=(\d+)").expect("expire pattern is valid")
});

/// Cache key for a search query: trimmed and lower-cased.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Unix timestamp carried by the `expire` query parameter of `url`.
pub fn expire_param(url: &str) -> Option<i64> {
    EXPIRE_PARAM
        .captures(url)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

/// Time left until the first adaptive format's stream URL expires, relative
/// to `now`. Negative when the URL has already expired. `None` when there is
/// no adaptive format or its URL carries no usable `expire` parameter.
pub fn video_ttl(video: &Video, now: DateTime<Utc>) -> Option<TimeDelta> {
    let format = video.adaptive_formats.first()?;
    let expire = DateTime::from_timestamp(expire_param(&format.url)?, 0)?;
    Some(expire - now)
}

impl VideoCache {
    /// Caches `video` under the TTL derived from its stream URLs, or
    /// `fallback` when none can be derived. Returns the TTL applied; an
    /// already expired URL yields `Duration::ZERO` and an entry that misses
    /// on the next lookup.
    pub fn insert_video(&self, video_id: String, video: Video, fallback: Duration) -> Duration {
        let ttl = match video_ttl(&video, Utc::now()) {
            Some(delta) => delta.to_std().unwrap_or(Duration::ZERO),
            None => fallback,
        };

        debug!(video_id = %video_id, ?ttl, "caching video");
        self.set(video_id, video, ttl);
        ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Format;

    fn video_with_url(url: &str) -> Video {
        Video {
            video_id: "abc".to_string(),
            adaptive_formats: vec![Format {
                url: url.to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_query_normalization() {
        assert_eq!(normalize_query("  Foo Bar "), normalize_query("foo bar"));
        assert_eq!(normalize_query("\tMIXED case\n"), "mixed case");
    }

    #[test]
    fn test_expire_param_is_case_insensitive() {
        assert_eq!(
            expire_param("https://r.example/videoplayback?id=1&expire=1700000000&ei=x"),
            Some(1_700_000_000)
        );
        assert_eq!(
            expire_param("https://r.example/videoplayback?EXPIRE=42"),
            Some(42)
        );
        assert_eq!(expire_param("https://r.example/videoplayback?noexpire=42"), None);
        assert_eq!(expire_param("https://r.example/videoplayback?expire=soon"), None);
    }

    #[test]
    fn test_ttl_is_expire_minus_now() {
        let video = video_with_url("https://r.example/videoplayback?itag=140&expire=1700000000&x=y");

        let now = DateTime::from_timestamp(1_699_996_400, 0).unwrap();
        assert_eq!(video_ttl(&video, now), Some(TimeDelta::seconds(3600)));

        let later = DateTime::from_timestamp(1_700_000_100, 0).unwrap();
        assert_eq!(video_ttl(&video, later), Some(TimeDelta::seconds(-100)));
    }

    #[test]
    fn test_ttl_falls_back_without_usable_formats() {
        let now = Utc::now();
        assert_eq!(video_ttl(&Video::default(), now), None);
        assert_eq!(video_ttl(&video_with_url("https://r.example/no-params"), now), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_video_uses_fallback_ttl() {
        let cache = VideoCache::new(Duration::from_secs(60));
        let ttl = cache.insert_video("abc".into(), Video::default(), Duration::from_secs(5 * 3600));

        assert_eq!(ttl, Duration::from_secs(5 * 3600));
        tokio::time::advance(Duration::from_secs(5 * 3600 - 1)).await;
        assert!(cache.get("abc").is_ok());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("abc").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_video_with_absurd_expiry_does_not_panic() {
        let cache = VideoCache::new(Duration::from_secs(60));
        cache.insert_video(
            "abc".into(),
            video_with_url("https://r.example/videoplayback?expire=9000000000000"),
            Duration::from_secs(5 * 3600),
        );

        assert!(cache.get("abc").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_video_with_past_expiry_misses_immediately() {
        let cache = VideoCache::new(Duration::from_secs(60));
        let ttl = cache.insert_video(
            "abc".into(),
            video_with_url("https://r.example/videoplayback?expire=1000"),
            Duration::from_secs(5 * 3600),
        );

        assert_eq!(ttl, Duration::ZERO);
        assert_eq!(cache.get("abc"), Err(LookupMiss::Expired));
    }
}
