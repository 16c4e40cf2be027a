use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{RelayError, Result};
use crate::transport::HttpTransport;

/// Performs one upstream call against a given instance and classifies the
/// outcome:
///
/// - transport failure or unparsable 200 body → [`RelayError::Internal`]
/// - 404 → [`RelayError::NotFound`]
/// - 200 → the payload
/// - anything else → [`RelayError::Upstream`] with the status
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    api_version: String,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>, api_version: impl Into<String>) -> Self {
        Self {
            transport,
            api_version: api_version.into(),
        }
    }

    /// `https://{instance}/api/{version}/{path}`
    pub fn endpoint(&self, instance: &str, path: &str) -> String {
        format!(
            "https://{}/api/{}/{}",
            instance,
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    pub async fn get_bytes(&self, instance: &str, path: &str, resource: &str) -> Result<Bytes> {
        let url = self.endpoint(instance, path);
        debug!(%url, "upstream request");

        let response = self.transport.get(&url).await.map_err(|e| {
            warn!(instance, error = %e, "transport failure");
            RelayError::from(e)
        })?;

        match response.status {
            200 => Ok(response.body),
            404 => Err(RelayError::NotFound {
                resource: resource.to_string(),
            }),
            status => {
                warn!(instance, status, "Invidious gave an unexpected status code");
                Err(RelayError::Upstream { status })
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        instance: &str,
        path: &str,
        resource: &str,
    ) -> Result<T> {
        let body = self.get_bytes(instance, path, resource).await?;

        serde_json::from_slice(&body).map_err(|e| {
            warn!(instance, error = %e, "could not parse upstream payload");
            RelayError::Internal(format!("invalid payload from {instance}: {e}"))
        })
    }
}
