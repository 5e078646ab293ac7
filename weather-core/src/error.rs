//! Error taxonomy for the fetch layer and the search flow.
//!
//! `FetchError` carries developer-facing detail and is only ever logged.
//! `SearchError` displays as the short message shown to the user.

use thiserror::Error;

/// Failure of a single outbound request.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Upstream answered with a non-2xx status.
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never completed (DNS, connect, timeout, reset).
    #[error("request could not be completed: {0}")]
    Network(String),

    /// The body was not the JSON shape we expect.
    #[error("failed to parse response: {0}")]
    Decode(String),
}

impl FetchError {
    /// HTTP status for `Status` failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

/// Terminal outcome of a failed search.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Please enter a city name.")]
    EmptyInput,

    /// `query` is the input exactly as the user typed it.
    #[error("No results found for \"{query}\"")]
    NoGeocodingMatch { query: String },

    #[error("Network error or API error. Please try again.")]
    Transport(#[source] FetchError),

    #[error("Weather data not available for that location.")]
    NoWeatherData,
}

impl SearchError {
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<FetchError> for SearchError {
    fn from(err: FetchError) -> Self {
        SearchError::Transport(err)
    }
}
