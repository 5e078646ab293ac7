//! Search orchestration: city name → coordinates → weather.
//!
//! Each search is a short sequence of immutable [`SearchState`] values. The
//! caller observes every transition through a callback and receives the
//! terminal state as the return value.

use serde::Serialize;

use crate::{error::SearchError, model::WeatherResult, provider::WeatherProvider};

/// A successful search: the weather plus the location label to show with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub location: String,
    pub result: WeatherResult,
}

/// Observable search state. Result and error are mutually exclusive and
/// neither exists while loading.
#[derive(Debug, Clone, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Loading,
    Success(SearchOutcome),
    Failure(SearchError),
}

impl SearchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Loading)
    }

    pub fn outcome(&self) -> Option<&SearchOutcome> {
        match self {
            SearchState::Success(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SearchError> {
        match self {
            SearchState::Failure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Result<SearchOutcome, SearchError>> for SearchState {
    fn from(res: Result<SearchOutcome, SearchError>) -> Self {
        match res {
            Ok(outcome) => SearchState::Success(outcome),
            Err(err) => SearchState::Failure(err),
        }
    }
}

/// Run one search for `input`.
///
/// `on_transition` sees `Idle` (prior state cleared), then `Loading` unless
/// the input is blank, then the terminal state, which is also returned.
pub async fn handle_search<P, F>(provider: &P, input: &str, mut on_transition: F) -> SearchState
where
    P: WeatherProvider + ?Sized,
    F: FnMut(&SearchState),
{
    on_transition(&SearchState::Idle);

    let city = input.trim();
    if city.is_empty() {
        let state = SearchState::Failure(SearchError::EmptyInput);
        on_transition(&state);
        return state;
    }

    on_transition(&SearchState::Loading);

    let state = SearchState::from(lookup(provider, input, city).await);
    if let SearchState::Failure(err) = &state {
        match err {
            SearchError::Transport(cause) => {
                tracing::debug!(input, error = %cause, "search failed");
            }
            other => tracing::debug!(input, reason = %other, "search ended without result"),
        }
    }

    on_transition(&state);
    state
}

async fn lookup<P>(provider: &P, input: &str, city: &str) -> Result<SearchOutcome, SearchError>
where
    P: WeatherProvider + ?Sized,
{
    let candidates = provider.resolve_coordinates(city).await?;

    // First candidate is the geocoder's best match.
    let place = candidates
        .into_iter()
        .next()
        .ok_or_else(|| SearchError::NoGeocodingMatch { query: input.to_string() })?;

    tracing::debug!(name = %place.name, lat = place.latitude, lon = place.longitude, "resolved place");

    let result = provider
        .resolve_weather(place.latitude, place.longitude)
        .await?
        .ok_or(SearchError::NoWeatherData)?;

    Ok(SearchOutcome { location: place.display_name(), result })
}

/// Owns the current search state for a single interactive session.
///
/// `handle_search` borrows the orchestrator mutably, so a second search can
/// only begin once the previous one has finished.
#[derive(Debug)]
pub struct Orchestrator<P> {
    provider: P,
    state: SearchState,
}

impl<P: WeatherProvider> Orchestrator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider, state: SearchState::Idle }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub async fn handle_search<F>(&mut self, input: &str, on_transition: F) -> &SearchState
    where
        F: FnMut(&SearchState),
    {
        self.state = handle_search(&self.provider, input, on_transition).await;
        &self.state
    }
}
