use crate::{
    Config, FetchError, PlaceCandidate, WeatherResult, provider::openmeteo::OpenMeteoProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openmeteo;

/// The fetch layer: name → coordinates, coordinates → weather.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Candidates for a city name, best-ranked first. An empty vector means
    /// the name matched nothing; that is not an error.
    async fn resolve_coordinates(&self, city_name: &str) -> Result<Vec<PlaceCandidate>, FetchError>;

    /// Current conditions plus the hourly sample, or `None` when upstream has
    /// no current-conditions block for this location.
    async fn resolve_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<WeatherResult>, FetchError>;
}

#[async_trait]
impl<P: WeatherProvider + ?Sized> WeatherProvider for Box<P> {
    async fn resolve_coordinates(&self, city_name: &str) -> Result<Vec<PlaceCandidate>, FetchError> {
        (**self).resolve_coordinates(city_name).await
    }

    async fn resolve_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<WeatherResult>, FetchError> {
        (**self).resolve_weather(latitude, longitude).await
    }
}

/// Construct the Open-Meteo provider described by `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let provider = OpenMeteoProvider::from_config(config)?;
    Ok(Box::new(provider))
}
