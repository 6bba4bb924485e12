//! Error types for the GitHub adapter and the mapping of HTTP failures onto
//! [`census::TrackerError`].

use census::TrackerError;
use thiserror::Error;

// HTTP status code constants
const HTTP_UNAUTHORIZED: u16 = 401;
const HTTP_FORBIDDEN: u16 = 403;
const HTTP_NOT_FOUND: u16 = 404;

/// Failure to construct a [`crate::GithubClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The token contains characters that cannot be sent in a header.
    #[error("GitHub token is not a valid header value")]
    InvalidToken,

    /// The API base URL is empty.
    #[error("GitHub API URL must not be empty")]
    MissingApiUrl,

    /// The underlying HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Maps a non-success HTTP status to a tracker error.
///
/// `resource` describes what was requested and is used for the not-found
/// message, e.g. `"label 'size:XL' in acme/widgets"`.
pub(crate) fn status_error(
    resource: &str,
    status: u16,
    message: String,
    retry_after_secs: Option<u64>,
) -> TrackerError {
    match status {
        HTTP_NOT_FOUND => TrackerError::NotFound {
            resource: resource.to_string(),
        },
        HTTP_UNAUTHORIZED | HTTP_FORBIDDEN => TrackerError::Unauthorized { status, message },
        _ => TrackerError::Api {
            status,
            message,
            retry_after_secs,
        },
    }
}

/// Maps a transport-level `reqwest` failure to a tracker error.
pub(crate) fn transport_error(resource: &str, error: &reqwest::Error) -> TrackerError {
    if error.is_timeout() {
        TrackerError::Timeout {
            operation: format!("fetch {resource}"),
        }
    } else if error.is_decode() {
        TrackerError::Decode {
            message: format!("{resource}: {error}"),
        }
    } else {
        TrackerError::Transport {
            message: format!("{resource}: {error}"),
        }
    }
}
