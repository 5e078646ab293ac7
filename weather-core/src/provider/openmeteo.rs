use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::{
    config::Config,
    error::FetchError,
    model::{HourlyPoint, PlaceCandidate, WeatherResult, WeatherSnapshot},
    transport::{HttpTransport, ReqwestTransport},
};

use super::WeatherProvider;

/// Number of geocoding candidates requested.
pub const CANDIDATE_COUNT: u8 = 5;
pub const FORECAST_DAYS: u8 = 2;
/// Hourly entries kept for display.
pub const HOURLY_SAMPLE_LEN: usize = 12;

const HOURLY_SERIES: &str =
    "temperature_2m,apparent_temperature,relativehumidity_2m,weathercode,windspeed_10m";

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider<T = ReqwestTransport> {
    transport: T,
    geocoding_url: String,
    forecast_url: String,
    language: String,
}

impl OpenMeteoProvider<ReqwestTransport> {
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: HttpTransport> OpenMeteoProvider<T> {
    pub fn with_transport(transport: T, config: &Config) -> Self {
        Self {
            transport,
            geocoding_url: config.endpoints.geocoding_url.clone(),
            forecast_url: config.endpoints.forecast_url.clone(),
            language: config.language.clone(),
        }
    }

    /// GET and return the body of a 2xx response.
    async fn get_ok(
        &self,
        endpoint: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, FetchError> {
        let res = self.transport.get(url, query).await?;

        if !res.is_success() {
            tracing::debug!(endpoint, status = res.status, "upstream returned an error status");
            return Err(FetchError::Status { status: res.status, body: truncate_body(&res.body) });
        }

        Ok(res.body)
    }
}

#[derive(Debug, Deserialize)]
struct OmPlace {
    name: String,
    country: Option<String>,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct OmSearchResponse {
    results: Option<Vec<OmPlace>>,
}

#[derive(Debug, Deserialize)]
struct OmCurrentWeather {
    temperature: f64,
    windspeed: f64,
    winddirection: f64,
    weathercode: i32,
    time: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OmHourly {
    time: Vec<Option<String>>,
    temperature_2m: Vec<Option<f64>>,
    apparent_temperature: Vec<Option<f64>>,
    relativehumidity_2m: Vec<Option<f64>>,
    weathercode: Vec<Option<i32>>,
    windspeed_10m: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    current_weather: Option<OmCurrentWeather>,
    #[serde(default)]
    hourly: OmHourly,
    #[serde(default)]
    timezone: String,
}

#[async_trait]
impl<T: HttpTransport> WeatherProvider for OpenMeteoProvider<T> {
    async fn resolve_coordinates(&self, city_name: &str) -> Result<Vec<PlaceCandidate>, FetchError> {
        let query = [
            ("name", city_name.trim().to_string()),
            ("count", CANDIDATE_COUNT.to_string()),
            ("language", self.language.clone()),
            ("format", "json".to_string()),
        ];

        let body = self.get_ok("geocoding", &self.geocoding_url, &query).await?;
        let parsed: OmSearchResponse = serde_json::from_str(&body)?;

        let candidates: Vec<PlaceCandidate> = parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|p| PlaceCandidate {
                name: p.name,
                country: p.country,
                latitude: p.latitude,
                longitude: p.longitude,
            })
            .collect();

        tracing::debug!(city_name, found = candidates.len(), "geocoding lookup done");
        Ok(candidates)
    }

    async fn resolve_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<WeatherResult>, FetchError> {
        let query = [
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("current_weather", "true".to_string()),
            ("hourly", HOURLY_SERIES.to_string()),
            ("forecast_days", FORECAST_DAYS.to_string()),
            ("timezone", "auto".to_string()),
        ];

        let body = self.get_ok("forecast", &self.forecast_url, &query).await?;
        let parsed: OmForecastResponse = serde_json::from_str(&body)?;

        let Some(current) = parsed.current_weather else {
            tracing::debug!(latitude, longitude, "forecast response has no current_weather");
            return Ok(None);
        };

        Ok(Some(WeatherResult {
            current: WeatherSnapshot {
                temperature: current.temperature,
                windspeed: current.windspeed,
                winddirection: current.winddirection,
                condition_code: current.weathercode,
                observed_at: parse_local_time(&current.time)?,
            },
            hourly: hourly_sample(&parsed.hourly),
            timezone: parsed.timezone,
        }))
    }
}

/// Zip the parallel hourly series by index, keyed on `time`, keeping at most
/// `HOURLY_SAMPLE_LEN` entries. Indices whose time is null or unparsable are
/// skipped; the other series stay aligned to their original index.
fn hourly_sample(hourly: &OmHourly) -> Vec<HourlyPoint> {
    hourly
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| match raw.as_deref().map(parse_local_time) {
            Some(Ok(time)) => Some((i, time)),
            _ => {
                tracing::debug!(index = i, ?raw, "skipping hourly entry without a valid time");
                None
            }
        })
        .take(HOURLY_SAMPLE_LEN)
        .map(|(i, time)| HourlyPoint {
            time,
            temperature: at(&hourly.temperature_2m, i),
            apparent_temperature: at(&hourly.apparent_temperature, i),
            relative_humidity: at(&hourly.relativehumidity_2m, i),
            condition_code: at(&hourly.weathercode, i),
            windspeed: at(&hourly.windspeed_10m, i),
        })
        .collect()
}

fn at<V: Copy>(series: &[Option<V>], i: usize) -> Option<V> {
    series.get(i).copied().flatten()
}

/// Open-Meteo emits `2024-01-01T12:00` (local time, no offset) with
/// `timezone=auto`; seconds are accepted too.
fn parse_local_time(s: &str) -> Result<NaiveDateTime, FetchError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| FetchError::Decode(format!("invalid timestamp '{s}': {e}")))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpResponse;
    use chrono::{NaiveDate, Timelike};
    use serde_json::json;
    use std::{collections::VecDeque, sync::Mutex};

    type Call = (String, Vec<(String, String)>);

    /// Replays canned responses in order and records each request.
    #[derive(Debug, Default)]
    struct StubTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, FetchError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl StubTransport {
        fn replying(status: u16, body: impl ToString) -> Self {
            let stub = Self::default();
            stub.responses
                .lock()
                .unwrap()
                .push_back(Ok(HttpResponse { status, body: body.to_string() }));
            stub
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for StubTransport {
        async fn get(
            &self,
            url: &str,
            query: &[(&str, String)],
        ) -> Result<HttpResponse, FetchError> {
            self.calls.lock().unwrap().push((
                url.to_string(),
                query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            ));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Network("no canned response".into())))
        }
    }

    fn provider(transport: StubTransport) -> OpenMeteoProvider<StubTransport> {
        OpenMeteoProvider::with_transport(transport, &Config::default())
    }

    fn param<'a>(call: &'a Call, key: &str) -> Option<&'a str> {
        call.1.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn hourly_json(len: usize) -> serde_json::Value {
        let times: Vec<String> = (0..len)
            .map(|i| format!("2024-01-{:02}T{:02}:00", 1 + i / 24, i % 24))
            .collect();
        let temps: Vec<f64> = (0..len).map(|i| i as f64 + 0.5).collect();
        let codes: Vec<i32> = (0..len).map(|i| if i % 2 == 0 { 0 } else { 3 }).collect();
        let winds: Vec<f64> = (0..len).map(|i| 10.0 + i as f64).collect();
        json!({
            "time": times,
            "temperature_2m": temps,
            "apparent_temperature": temps,
            "relativehumidity_2m": vec![80; len],
            "weathercode": codes,
            "windspeed_10m": winds,
        })
    }

    fn forecast_json(hourly: serde_json::Value) -> serde_json::Value {
        json!({
            "latitude": 51.5,
            "longitude": -0.12,
            "timezone": "Europe/London",
            "current_weather": {
                "temperature": 15.4,
                "windspeed": 10.2,
                "winddirection": 240,
                "weathercode": 3,
                "time": "2024-01-01T12:00"
            },
            "hourly": hourly
        })
    }

    #[tokio::test]
    async fn geocoding_sends_trimmed_name_and_fixed_params() {
        let body = json!({ "results": [
            { "name": "London", "country": "United Kingdom", "latitude": 51.51, "longitude": -0.13 },
            { "name": "London", "country": "Canada", "latitude": 42.98, "longitude": -81.23 }
        ]});
        let p = provider(StubTransport::replying(200, body));

        let places = p.resolve_coordinates("  London ").await.unwrap();

        assert_eq!(places.len(), 2);
        assert_eq!(places[0].country.as_deref(), Some("United Kingdom"));
        assert_eq!(places[0].latitude, 51.51);

        let calls = p.transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, crate::config::DEFAULT_GEOCODING_URL);
        assert_eq!(param(&calls[0], "name"), Some("London"));
        assert_eq!(param(&calls[0], "count"), Some("5"));
        assert_eq!(param(&calls[0], "language"), Some("en"));
        assert_eq!(param(&calls[0], "format"), Some("json"));
    }

    #[tokio::test]
    async fn geocoding_without_results_is_empty_not_error() {
        let p = provider(StubTransport::replying(200, json!({ "generationtime_ms": 0.4 })));
        assert!(p.resolve_coordinates("Xyzzyville").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn geocoding_candidate_without_country() {
        let body = json!({ "results": [{ "name": "Nowhere", "latitude": 1.0, "longitude": 2.0 }] });
        let p = provider(StubTransport::replying(200, body));

        let places = p.resolve_coordinates("Nowhere").await.unwrap();
        assert_eq!(places[0].country, None);
    }

    #[tokio::test]
    async fn geocoding_error_status_carries_code() {
        let p = provider(StubTransport::replying(500, "internal error"));

        let err = p.resolve_coordinates("London").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn network_failure_passes_through() {
        let p = provider(StubTransport::default());
        let err = p.resolve_coordinates("London").await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn forecast_sends_expected_params() {
        let p = provider(StubTransport::replying(200, forecast_json(hourly_json(3))));

        p.resolve_weather(51.51, -0.13).await.unwrap();

        let calls = p.transport.calls();
        assert_eq!(calls[0].0, crate::config::DEFAULT_FORECAST_URL);
        assert_eq!(param(&calls[0], "latitude"), Some("51.51"));
        assert_eq!(param(&calls[0], "longitude"), Some("-0.13"));
        assert_eq!(param(&calls[0], "current_weather"), Some("true"));
        assert_eq!(param(&calls[0], "hourly"), Some(HOURLY_SERIES));
        assert_eq!(param(&calls[0], "forecast_days"), Some("2"));
        assert_eq!(param(&calls[0], "timezone"), Some("auto"));
    }

    #[tokio::test]
    async fn forecast_normalizes_current_block() {
        let p = provider(StubTransport::replying(200, forecast_json(hourly_json(3))));

        let result = p.resolve_weather(51.51, -0.13).await.unwrap().unwrap();

        assert_eq!(result.timezone, "Europe/London");
        assert_eq!(result.current.temperature, 15.4);
        assert_eq!(result.current.windspeed, 10.2);
        assert_eq!(result.current.winddirection, 240.0);
        assert_eq!(result.current.condition_code, 3);
        assert_eq!(
            result.current.observed_at,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn forecast_without_current_block_is_none() {
        let body = json!({ "timezone": "GMT", "hourly": hourly_json(4) });
        let p = provider(StubTransport::replying(200, body));

        assert!(p.resolve_weather(0.0, 0.0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn forecast_error_status_carries_code() {
        let p = provider(StubTransport::replying(503, "unavailable"));

        let err = p.resolve_weather(0.0, 0.0).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn forecast_malformed_body_is_decode_error() {
        let p = provider(StubTransport::replying(200, "<html>oops</html>"));

        let err = p.resolve_weather(0.0, 0.0).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn forecast_without_hourly_block_has_empty_sample() {
        let mut body = forecast_json(json!({}));
        body.as_object_mut().unwrap().remove("hourly");
        let p = provider(StubTransport::replying(200, body));

        let result = p.resolve_weather(0.0, 0.0).await.unwrap().unwrap();
        assert!(result.hourly.is_empty());
    }

    #[test]
    fn hourly_sample_truncates_to_twelve() {
        let hourly: OmHourly = serde_json::from_value(hourly_json(20)).unwrap();

        let sample = hourly_sample(&hourly);

        assert_eq!(sample.len(), 12);
        for (i, point) in sample.iter().enumerate() {
            assert_eq!(point.time.hour() as usize, i);
            assert_eq!(point.temperature, Some(i as f64 + 0.5));
            assert_eq!(point.windspeed, Some(10.0 + i as f64));
        }
    }

    #[test]
    fn hourly_sample_keeps_short_series_as_is() {
        let hourly: OmHourly = serde_json::from_value(hourly_json(5)).unwrap();
        assert_eq!(hourly_sample(&hourly).len(), 5);
    }

    #[test]
    fn hourly_sample_marks_missing_values_absent() {
        let hourly: OmHourly = serde_json::from_value(json!({
            "time": ["2024-01-01T00:00", "2024-01-01T01:00", "2024-01-01T02:00"],
            "temperature_2m": [1.0, null],
            "weathercode": [61],
        }))
        .unwrap();

        let sample = hourly_sample(&hourly);

        assert_eq!(sample.len(), 3);
        assert_eq!(sample[0].temperature, Some(1.0));
        assert_eq!(sample[0].condition_code, Some(61));
        assert_eq!(sample[1].temperature, None);
        assert_eq!(sample[1].condition_code, None);
        assert_eq!(sample[2].temperature, None);
        assert_eq!(sample[2].windspeed, None);
        assert_eq!(sample[2].relative_humidity, None);
    }

    #[test]
    fn hourly_sample_skips_bad_times_and_keeps_alignment() {
        let hourly: OmHourly = serde_json::from_value(json!({
            "time": ["2024-01-01T00:00", null, "not a time", "2024-01-01T03:00"],
            "temperature_2m": [0.0, 1.0, 2.0, 3.0],
            "weathercode": [0, 1, 2, 3],
        }))
        .unwrap();

        let sample = hourly_sample(&hourly);

        assert_eq!(sample.len(), 2);
        assert_eq!(sample[0].time.hour(), 0);
        assert_eq!(sample[0].temperature, Some(0.0));
        assert_eq!(sample[1].time.hour(), 3);
        assert_eq!(sample[1].temperature, Some(3.0));
        assert_eq!(sample[1].condition_code, Some(3));
    }

    #[tokio::test]
    async fn forecast_with_bad_hourly_time_still_succeeds() {
        let hourly = json!({
            "time": ["garbage", "2024-01-01T01:00"],
            "temperature_2m": [5.0, 6.0],
        });
        let p = provider(StubTransport::replying(200, forecast_json(hourly)));

        let result = p.resolve_weather(51.51, -0.13).await.unwrap().unwrap();

        assert_eq!(result.current.temperature, 15.4);
        assert_eq!(result.hourly.len(), 1);
        assert_eq!(result.hourly[0].temperature, Some(6.0));
    }

    #[test]
    fn local_time_accepts_minutes_and_seconds() {
        assert!(parse_local_time("2024-06-30T23:00").is_ok());
        assert!(parse_local_time("2024-06-30T23:00:15").is_ok());
        assert!(matches!(parse_local_time("yesterday"), Err(FetchError::Decode(_))));
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "é".repeat(300);
        let out = truncate_body(&long);
        assert_eq!(out.chars().count(), 203);
        assert!(out.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
