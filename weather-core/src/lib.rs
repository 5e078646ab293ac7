//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - The fetch layer over the Open-Meteo geocoding and forecast APIs
//! - The search orchestrator (city name → coordinates → weather)
//! - Shared domain models and the error taxonomy
//! - Configuration handling
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod condition;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod search;
pub mod transport;

pub use condition::describe_condition_code;
pub use config::{Config, Endpoints};
pub use error::{FetchError, SearchError};
pub use model::{HourlyPoint, PlaceCandidate, WeatherResult, WeatherSnapshot};
pub use provider::{WeatherProvider, openmeteo::OpenMeteoProvider, provider_from_config};
pub use search::{Orchestrator, SearchOutcome, SearchState, handle_search};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
