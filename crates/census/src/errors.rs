//! Error and retry-policy types for the census domain.
//!
//! [`TrackerError`] is the per-call failure of a port method. Most of them are
//! non-fatal: the pipeline turns them into [`crate::RunWarning`]s and keeps
//! going. [`CensusError`] covers the conditions that leave nothing to count,
//! which abort the run.
//!
//! [`RetryPolicy`] lets infrastructure adapters decide whether a failed call
//! may be re-issued.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RepositoryId;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable`: timeouts, rate limiting, server-side failures.
/// - `NonRetryable`: missing resources, bad credentials, malformed responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means apply the
        /// caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Tracker errors
// ---------------------------------------------------------------------------

/// A failed call to the issue tracker.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackerError {
    /// The requested resource does not exist (or is invisible to the token).
    #[error("Not found: {resource}")]
    NotFound {
        /// Description of the missing resource, e.g. `"label 'size:XL'"`.
        resource: String,
    },

    /// The tracker rejected the credentials.
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized {
        /// HTTP status code returned (401 or 403).
        status: u16,
        /// Message reported by the tracker.
        message: String,
    },

    /// The tracker returned an unexpected non-success status.
    #[error("Tracker API error ({status}): {message}")]
    Api {
        /// HTTP status code returned.
        status: u16,
        /// Message reported by the tracker.
        message: String,
        /// Seconds to wait before retrying, when the tracker said so.
        retry_after_secs: Option<u64>,
    },

    /// The call did not complete within the configured timeout.
    #[error("Request timed out: {operation}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
    },

    /// The request could not be sent or the connection failed.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode tracker response: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },
}

impl TrackerError {
    /// Returns `true` if this is the tracker's "resource does not exist" answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Classifies the error for retry decisions.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            Self::Api {
                status,
                retry_after_secs,
                ..
            } if *status == 429 || *status >= 500 => RetryPolicy::Retryable {
                after: retry_after_secs.map(Duration::from_secs),
            },
            _ => RetryPolicy::NonRetryable,
        }
    }
}

// ---------------------------------------------------------------------------
// Run-level errors
// ---------------------------------------------------------------------------

/// Errors that abort a census run.
///
/// Each one means there is no board to aggregate; per-column and per-label
/// failures never produce a [`CensusError`].
#[derive(Debug, Error)]
pub enum CensusError {
    /// The repository's projects could not be listed.
    #[error("Failed to list projects for {repository}")]
    ProjectListing {
        /// Repository whose projects were requested.
        repository: RepositoryId,
        /// Underlying tracker failure.
        #[source]
        source: TrackerError,
    },

    /// No project matched the request.
    #[error("No matching project in {repository}{}", wanted_suffix(.name))]
    ProjectNotFound {
        /// Repository that was searched.
        repository: RepositoryId,
        /// Requested project name, `None` when any project would have done.
        name: Option<String>,
    },

    /// The selected project's columns could not be listed.
    #[error("Failed to list columns of project '{project}'")]
    ColumnListing {
        /// Name of the selected project.
        project: String,
        /// Underlying tracker failure.
        #[source]
        source: TrackerError,
    },
}

fn wanted_suffix(name: &Option<String>) -> String {
    name.as_deref()
        .map(|n| format!(" (wanted '{n}')"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_retryable() {
        let err = TrackerError::Api {
            status: 502,
            message: "bad gateway".into(),
            retry_after_secs: None,
        };
        assert_eq!(err.retry_policy(), RetryPolicy::Retryable { after: None });
    }

    #[test]
    fn test_rate_limit_carries_retry_after() {
        let err = TrackerError::Api {
            status: 429,
            message: "slow down".into(),
            retry_after_secs: Some(3),
        };
        assert_eq!(
            err.retry_policy(),
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(3))
            }
        );
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let not_found = TrackerError::NotFound {
            resource: "label 'size:XL'".into(),
        };
        assert!(not_found.is_not_found());
        assert_eq!(not_found.retry_policy(), RetryPolicy::NonRetryable);

        let unprocessable = TrackerError::Api {
            status: 422,
            message: "validation failed".into(),
            retry_after_secs: None,
        };
        assert_eq!(unprocessable.retry_policy(), RetryPolicy::NonRetryable);
    }

    #[test]
    fn test_project_not_found_message() {
        let repository = RepositoryId::parse("acme/widgets").unwrap();
        let named = CensusError::ProjectNotFound {
            repository: repository.clone(),
            name: Some("Roadmap".into()),
        };
        assert_eq!(
            named.to_string(),
            "No matching project in acme/widgets (wanted 'Roadmap')"
        );

        let any = CensusError::ProjectNotFound {
            repository,
            name: None,
        };
        assert_eq!(any.to_string(), "No matching project in acme/widgets");
    }
}
