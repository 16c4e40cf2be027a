#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rabbitpipe::{HttpResponse, HttpTransport, RelayClient, RelayConfig, TransportError};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub const DIRECTORY: &str = rabbitpipe::directory::DEFAULT_DIRECTORY_URL;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("rabbitpipe=debug".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone)]
enum Reply {
    Response(u16, String),
    Unreachable,
}

/// In-memory transport answering by URL prefix.
///
/// Each prefix holds a queue of replies; the last reply of a queue repeats
/// forever. Every requested URL is recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<(String, VecDeque<Reply>)>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, prefix: &str, status: u16, body: impl Into<String>) -> &Self {
        self.push(prefix, Reply::Response(status, body.into()))
    }

    pub fn unreachable(&self, prefix: &str) -> &Self {
        self.push(prefix, Reply::Unreachable)
    }

    fn push(&self, prefix: &str, reply: Reply) -> &Self {
        let mut routes = self.routes.lock();
        match routes.iter_mut().find(|(p, _)| p == prefix) {
            Some((_, queue)) => queue.push_back(reply),
            None => routes.push((prefix.to_string(), VecDeque::from([reply]))),
        }
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|url| url.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(url.to_string());

        let reply = {
            let mut routes = self.routes.lock();
            let queue = routes
                .iter_mut()
                .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
                .max_by_key(|(prefix, _)| prefix.len())
                .map(|(_, queue)| queue);

            match queue {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Response(status, body)) => Ok(HttpResponse::new(status, body)),
            Some(Reply::Unreachable) => Err(TransportError::Request("connection refused".into())),
            None => Err(TransportError::Request(format!("no route for {url}"))),
        }
    }
}

/// Directory listing with `(host, type, api)` records, in order.
pub fn directory_json(instances: &[(&str, &str, Option<bool>)]) -> String {
    let records: Vec<_> = instances
        .iter()
        .map(|(host, kind, api)| {
            json!([host, {
                "flag": "🇩🇪",
                "region": "DE",
                "type": kind,
                "uri": format!("{kind}://{host}"),
                "api": api,
                "cors": true,
                "monitor": null,
            }])
        })
        .collect();
    serde_json::to_string(&records).unwrap()
}

/// Video payload whose first adaptive format expires at `expire` (unix secs).
pub fn video_json(video_id: &str, expire: Option<i64>) -> String {
    let formats = match expire {
        Some(expire) => json!([{
            "url": format!("https://rr.example/videoplayback?itag=140&expire={expire}&ei=abc"),
            "type": "audio/mp4; codecs=\"mp4a.40.2\"",
            "bitrate": "130000",
            "itag": "140",
        }]),
        None => json!([]),
    };

    json!({
        "type": "video",
        "title": format!("Video {video_id}"),
        "videoId": video_id,
        "author": "Tester",
        "lengthSeconds": 10,
        "adaptiveFormats": formats,
        "formatStreams": [],
        "captions": [{"label": "English", "language_code": "en", "url": "/api/v1/captions/x?label=English"}],
    })
    .to_string()
}

pub fn search_json(titles: &[&str]) -> String {
    let results: Vec<_> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| json!({"type": "video", "title": title, "videoId": format!("vid{i}")}))
        .collect();
    serde_json::to_string(&results).unwrap()
}

pub fn videos_url(host: &str) -> String {
    format!("https://{host}/api/v1/videos/")
}

pub fn config() -> RelayConfig {
    RelayConfig {
        directory_url: DIRECTORY.to_string(),
        ..Default::default()
    }
}

pub fn client(transport: &Arc<ScriptedTransport>) -> RelayClient {
    init_tracing();
    RelayClient::with_transport(config(), transport.clone())
}
