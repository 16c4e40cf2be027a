//! # rabbitpipe
//!
//! Read-through client for the Invidious video-metadata API.
//!
//! Invidious is served by many independently operated mirrors, any of which
//! may be down at a given moment. [`RelayClient`] hides that:
//!
//! - it keeps one *current instance*, picked from the public instance
//!   directory (HTTPS only, API enabled);
//! - when a call fails for any reason other than a 404, the instance is
//!   blacklisted for a cooldown and the call is retried on the next one;
//! - videos and search results are cached; a video stays cached only as long
//!   as its stream URLs remain valid.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rabbitpipe::{RelayClient, RelayConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = RelayClient::new(RelayConfig::load()?)?;
//!
//! let video = client.get_video("qRY0m96ESZU").await?;
//! println!("{} by {}", video.title, video.author);
//!
//! for result in client.search("youtube dl test video").await? {
//!     println!("{} ({})", result.title, result.video_id);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! [`RelayConfig::load`] reads `.env` and the environment:
//!
//! ```env
//! RABBITPIPE_INSTANCE=inv.nadeko.net   # optional preferred instance
//! RABBITPIPE_BLACKLIST_COOLDOWN=1h
//! RABBITPIPE_VIDEO_TTL=5h              # when stream URLs carry no expiry
//! RABBITPIPE_SEARCH_TTL=3h
//! RABBITPIPE_ROTATION_BACKOFF=10s
//! RABBITPIPE_MAX_ATTEMPTS=10           # 0 = retry until no instance is left
//! ```

pub mod blacklist;
pub mod cache;
pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod executor;
pub mod models;
pub mod transport;

pub use client::RelayClient;
pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use models::{SearchResult, Video};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
