use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Rejected user input. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Enter a city name to look up the weather")]
    Blank,
}

/// Why a single weather fetch failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The service answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Could not reach the service, or the connection broke mid-response.
    #[error("Could not reach the weather service")]
    Transport(#[source] reqwest::Error),

    #[error("The weather service did not answer within {}s", .0.as_secs())]
    Timeout(Duration),

    /// A 2xx body that is missing required fields or is not JSON at all.
    #[error("The weather service sent a response that could not be read")]
    Parse(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Http,
    Transport,
    Timeout,
    Parse,
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Http { .. } => FailureKind::Http,
            FetchError::Transport(_) => FailureKind::Transport,
            FetchError::Timeout(_) => FailureKind::Timeout,
            FetchError::Parse(_) => FailureKind::Parse,
        }
    }

    /// Map a reqwest failure, keeping its own timeout distinct from transport errors.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Transport(err)
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Http => "http",
            FailureKind::Transport => "transport",
            FailureKind::Timeout => "timeout",
            FailureKind::Parse => "parse",
        };
        f.write_str(s)
    }
}
