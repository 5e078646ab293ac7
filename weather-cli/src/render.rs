//! Plain-text rendering of search state. Styling is applied by the caller.

use weather_core::{
    HourlyPoint, SearchError, SearchOutcome, SearchState, describe_condition_code,
};

pub const ATTRIBUTION: &str = "Data provided by Open-Meteo (https://open-meteo.com).";

/// Label of the submit action.
pub fn search_label(loading: bool) -> &'static str {
    if loading { "Searching…" } else { "Search" }
}

pub fn render_loading() -> String {
    "Loading…".to_string()
}

pub fn render_error(err: &SearchError) -> String {
    format!("Error: {}", err.message())
}

pub fn render_result(outcome: &SearchOutcome) -> String {
    let SearchOutcome { location, result } = outcome;
    let current = &result.current;

    let location = if location.is_empty() { "Location" } else { location.as_str() };

    let mut lines = vec![
        location.to_string(),
        result.timezone.clone(),
        String::new(),
        format!(
            "{}°C  {}",
            round(current.temperature),
            describe_condition_code(current.condition_code)
        ),
        format!(
            "Wind         {} km/h from {}°",
            round(current.windspeed),
            round(current.winddirection)
        ),
        format!("Measured at  {}", current.observed_at.format("%a, %-d %b %Y %H:%M")),
    ];

    if !result.hourly.is_empty() {
        lines.push(String::new());
        lines.push("Hourly snapshot".to_string());
        lines.extend(result.hourly.iter().map(render_hour));
    }

    lines.join("\n")
}

fn render_hour(point: &HourlyPoint) -> String {
    let temp = point
        .temperature
        .map_or_else(|| "--°".to_string(), |t| format!("{}°", round(t)));
    let description = point.condition_code.map_or("Unknown", describe_condition_code);

    format!("  {}  {:>4}  {}", point.time.format("%H:%M"), temp, description)
}

/// Exactly one of loading, error, or result; nothing while idle.
pub fn render_state(state: &SearchState) -> Option<String> {
    match state {
        SearchState::Idle => None,
        SearchState::Loading => Some(render_loading()),
        SearchState::Failure(err) => Some(render_error(err)),
        SearchState::Success(outcome) => Some(render_result(outcome)),
    }
}

/// Screen update for one state transition: erase `clear_lines` lines written
/// by the previous transition, then print `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub clear_lines: usize,
    pub text: Option<String>,
}

/// Tracks the transient loading line so each transition replaces it instead
/// of stacking below it.
#[derive(Debug, Default)]
pub struct LiveView {
    /// Whether a loading line can be erased later. Off when stdout is not a
    /// terminal, in which case loading is never drawn.
    transient: bool,
    pending: usize,
}

impl LiveView {
    pub fn new(transient: bool) -> Self {
        Self { transient, pending: 0 }
    }

    pub fn apply(&mut self, state: &SearchState) -> Frame {
        let clear_lines = std::mem::take(&mut self.pending);

        let text = match state {
            SearchState::Loading if !self.transient => None,
            other => render_state(other),
        };

        if state.is_loading() {
            self.pending = text.as_deref().map_or(0, |t| t.lines().count());
        }

        Frame { clear_lines, text }
    }
}

/// Nearest integer, halves away from zero.
fn round(value: f64) -> i64 {
    value.round() as i64
}
