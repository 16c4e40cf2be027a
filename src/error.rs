use thiserror::Error;

use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Error, Debug)]
pub enum RelayError {
    /// The entity does not exist upstream. Never triggers a rotation.
    #[error("{resource} does not exist or can't be retrieved")]
    NotFound { resource: String },

    #[error("upstream answered with HTTP {status}")]
    Upstream { status: u16 },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("cannot find a valid instance")]
    NoValidInstance,

    #[error("instance directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("gave up after {attempts} attempts")]
    RetriesExhausted { attempts: usize },
}

impl RelayError {
    /// Whether the failover loop should rotate and try again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RelayError::Upstream { .. }
                | RelayError::Internal(_)
                | RelayError::DirectoryUnavailable(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RelayError::NotFound { .. })
    }
}

impl From<TransportError> for RelayError {
    fn from(err: TransportError) -> Self {
        RelayError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_retry_classification() {
        assert!(RelayError::Upstream { status: 502 }.is_retryable());
        assert!(RelayError::Internal("boom".into()).is_retryable());
        assert!(RelayError::DirectoryUnavailable("down".into()).is_retryable());

        assert!(!RelayError::NotFound { resource: "video x".into() }.is_retryable());
        assert!(!RelayError::NoValidInstance.is_retryable());
        assert!(!RelayError::RetriesExhausted { attempts: 3 }.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let cases = [
            (
                RelayError::NotFound { resource: "video abc".into() },
                "video abc does not exist or can't be retrieved",
            ),
            (RelayError::Upstream { status: 503 }, "upstream answered with HTTP 503"),
            (RelayError::NoValidInstance, "cannot find a valid instance"),
            (RelayError::RetriesExhausted { attempts: 4 }, "gave up after 4 attempts"),
        ];

        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_transport_errors_become_internal() {
        let err: RelayError = TransportError::Timeout(Duration::from_secs(15)).into();
        assert!(matches!(err, RelayError::Internal(_)));
    }
}
