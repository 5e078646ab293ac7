use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A geocoding match for a free-text place name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub name: String,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl PlaceCandidate {
    /// "Name, Country", or just the name when the geocoder gave no country.
    pub fn display_name(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }
}

/// Current-instant reading. Units: °C, km/h, degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub windspeed: f64,
    pub winddirection: f64,
    pub condition_code: i32,
    /// Local wall-clock time at the location.
    pub observed_at: NaiveDateTime,
}

/// One entry of the hourly sample. Any field the upstream series lacked at
/// this index is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub time: NaiveDateTime,
    pub temperature: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub condition_code: Option<i32>,
    pub windspeed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub current: WeatherSnapshot,
    pub hourly: Vec<HourlyPoint>,
    pub timezone: String,
}
