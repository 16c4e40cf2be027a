use std::sync::Arc;
use tracing::{debug, warn};

use crate::blacklist::Blacklist;
use crate::error::{RelayError, Result};
use crate::models::InstanceDetail;
use crate::transport::HttpTransport;

/// Public directory of Invidious instances, sorted by API availability.
pub const DEFAULT_DIRECTORY_URL: &str = "https://api.invidious.io/instances.json?sort_by=api,type";

/// One `[host, detail]` record of the directory listing.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceCandidate {
    pub host: String,
    pub detail: InstanceDetail,
}

impl InstanceCandidate {
    /// Served over HTTPS with the API explicitly enabled. A missing `api`
    /// flag counts as disabled.
    pub fn is_eligible(&self) -> bool {
        self.detail.instance_type == "https" && self.detail.api == Some(true)
    }
}

impl From<(String, InstanceDetail)> for InstanceCandidate {
    fn from((host, detail): (String, InstanceDetail)) -> Self {
        Self { host, detail }
    }
}

/// Fetches the candidate list and picks a usable instance from it.
pub struct InstanceDirectory {
    transport: Arc<dyn HttpTransport>,
    url: String,
}

impl InstanceDirectory {
    pub fn new(transport: Arc<dyn HttpTransport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Candidates in the order the directory lists them.
    pub async fn fetch(&self) -> Result<Vec<InstanceCandidate>> {
        debug!(url = %self.url, "fetching instance directory");

        let response = self
            .transport
            .get(&self.url)
            .await
            .map_err(|e| RelayError::DirectoryUnavailable(e.to_string()))?;

        if response.status != 200 {
            return Err(RelayError::DirectoryUnavailable(format!(
                "HTTP error: {}",
                response.status
            )));
        }

        let records: Vec<serde_json::Value> = serde_json::from_slice(&response.body)
            .map_err(|e| {
                warn!(error = %e, "could not parse instance directory");
                RelayError::DirectoryUnavailable(format!("malformed directory listing: {e}"))
            })?;

        // A record the models cannot read only costs that one candidate.
        let total = records.len();
        let candidates: Vec<InstanceCandidate> = records
            .into_iter()
            .enumerate()
            .filter_map(|(position, record)| {
                match serde_json::from_value::<(String, InstanceDetail)>(record) {
                    Ok(pair) => Some(InstanceCandidate::from(pair)),
                    Err(e) => {
                        warn!(position, error = %e, "skipping unreadable directory record");
                        None
                    }
                }
            })
            .collect();

        debug!(total, usable = candidates.len(), "parsed instance directory");
        Ok(candidates)
    }

    /// Fetches the directory and returns the first eligible, non-blacklisted host.
    pub async fn resolve(&self, blacklist: &Blacklist) -> Result<String> {
        let candidates = self.fetch().await?;
        select(&candidates, blacklist).map(|candidate| candidate.host.clone())
    }
}

/// First eligible candidate that is not cooling down.
pub fn select<'a>(
    candidates: &'a [InstanceCandidate],
    blacklist: &Blacklist,
) -> Result<&'a InstanceCandidate> {
    candidates
        .iter()
        .filter(|candidate| candidate.is_eligible())
        .find(|candidate| !blacklist.contains(&candidate.host))
        .ok_or(RelayError::NoValidInstance)
}
