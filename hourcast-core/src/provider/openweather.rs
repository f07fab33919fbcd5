use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::{DistanceUnit, Position, WeatherError, WeatherState};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    distance_unit: DistanceUnit,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        distance_unit: DistanceUnit,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            distance_unit,
            http,
        })
    }

    async fn fetch_current(&self, position: Position) -> Result<WeatherState, WeatherError> {
        tracing::debug!(
            latitude = position.latitude,
            longitude = position.longitude,
            "Fetching current weather from OpenWeather"
        );

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", position.latitude.to_string()),
                ("lon", position.longitude.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        let parsed = parse_current(status, &body)?;
        normalize(&parsed, self.distance_unit, &Local)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, position: Position) -> Result<WeatherState, WeatherError> {
        self.fetch_current(position).await
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    temp_max: f64,
    temp_min: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    visibility: f64,
    sys: OwSys,
}

/// OpenWeather reports `cod` as a number on success and sometimes as a string
/// on errors.
fn is_unauthorized(status: StatusCode, body: &Value) -> bool {
    if status == StatusCode::UNAUTHORIZED {
        return true;
    }
    match body.get("cod") {
        Some(Value::Number(n)) => n.as_i64() == Some(401),
        Some(Value::String(s)) => s == "401",
        _ => false,
    }
}

/// Turns a raw response into the typed payload, or the reason there is none.
/// The HTTP status alone never decides: OpenWeather explains itself in the body.
fn parse_current(status: StatusCode, body: &str) -> Result<OwCurrentResponse, WeatherError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        WeatherError::Malformed(format!("{e} (body: {})", truncate_body(body)))
    })?;

    if is_unauthorized(status, &value) {
        return Err(WeatherError::Unauthorized);
    }

    if value.get("main").is_none_or(Value::is_null) {
        return Err(WeatherError::MissingPayload { status: status.as_u16() });
    }

    serde_json::from_value(value).map_err(|e| WeatherError::Malformed(e.to_string()))
}

fn round(value: f64) -> i64 {
    value.round() as i64
}

fn epoch_to_utc(secs: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| WeatherError::Malformed(format!("timestamp {secs} out of range")))
}

fn normalize<Tz>(
    parsed: &OwCurrentResponse,
    unit: DistanceUnit,
    tz: &Tz,
) -> Result<WeatherState, WeatherError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let weather = parsed
        .weather
        .first()
        .ok_or_else(|| WeatherError::Malformed("empty weather list".to_string()))?;

    let sunrise = epoch_to_utc(parsed.sys.sunrise)?;
    let sunset = epoch_to_utc(parsed.sys.sunset)?;
    let day = sunset - sunrise;

    Ok(WeatherState {
        temperature: round(parsed.main.temp),
        feels_like: round(parsed.main.feels_like),
        humidity: round(parsed.main.humidity),
        high: round(parsed.main.temp_max),
        low: round(parsed.main.temp_min),
        conditions: weather.main.clone(),
        description: weather.description.clone(),
        wind_speed: round(parsed.wind.speed),
        visibility: unit.convert_metres(parsed.visibility),
        sunrise: format_clock(&sunrise.with_timezone(tz)),
        sunset: format_clock(&sunset.with_timezone(tz)),
        day_length: format!("{}h {}m", day.num_hours(), day.num_minutes() % 60),
    })
}

fn format_clock<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format("%-I:%M %p").to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // 2023-11-14T22:13:20Z, and 12h 24m later.
    const SUNRISE: i64 = 1_700_000_000;
    const SUNSET: i64 = SUNRISE + 12 * 3600 + 24 * 60;

    fn payload() -> Value {
        json!({
            "cod": 200,
            "main": {
                "temp": 21.4,
                "feels_like": 20.6,
                "humidity": 56,
                "temp_max": 23.5,
                "temp_min": 18.49
            },
            "weather": [{ "main": "Rain", "description": "light rain" }],
            "wind": { "speed": 3.6 },
            "visibility": 10000,
            "sys": { "sunrise": SUNRISE, "sunset": SUNSET }
        })
    }

    fn parse(status: StatusCode, body: &Value) -> Result<OwCurrentResponse, WeatherError> {
        parse_current(status, &body.to_string())
    }

    #[test]
    fn well_formed_payload_normalizes() {
        let parsed = parse(StatusCode::OK, &payload()).expect("valid payload");
        let state = normalize(&parsed, DistanceUnit::Miles, &Utc).expect("normalizes");

        assert_eq!(state.temperature, 21);
        assert_eq!(state.feels_like, 21);
        assert_eq!(state.humidity, 56);
        assert_eq!(state.high, 24);
        assert_eq!(state.low, 18);
        assert_eq!(state.conditions, "Rain");
        assert_eq!(state.description, "light rain");
        assert_eq!(state.wind_speed, 4);
        assert_eq!(state.visibility, 6);
        assert_eq!(state.sunrise, "10:13 PM");
        assert_eq!(state.sunset, "10:37 AM");
        assert_eq!(state.day_length, "12h 24m");
    }

    #[test]
    fn visibility_in_kilometres() {
        let parsed = parse(StatusCode::OK, &payload()).expect("valid payload");
        let state = normalize(&parsed, DistanceUnit::Kilometers, &Utc).expect("normalizes");
        assert_eq!(state.visibility, 10);
    }

    #[test]
    fn cod_401_is_unauthorized() {
        let body = json!({ "cod": 401, "message": "Invalid API key" });
        let err = parse(StatusCode::UNAUTHORIZED, &body).unwrap_err();
        assert!(matches!(err, WeatherError::Unauthorized));

        let body = json!({ "cod": "401", "message": "Invalid API key" });
        let err = parse(StatusCode::OK, &body).unwrap_err();
        assert!(matches!(err, WeatherError::Unauthorized));
    }

    #[test]
    fn missing_main_is_rejected() {
        let body = json!({ "cod": "404", "message": "city not found" });
        let err = parse(StatusCode::NOT_FOUND, &body).unwrap_err();
        assert!(matches!(err, WeatherError::MissingPayload { status: 404 }));
    }

    #[test]
    fn partial_payload_is_malformed() {
        let mut body = payload();
        if let Some(obj) = body.as_object_mut() {
            obj.remove("sys");
        }
        let err = parse(StatusCode::OK, &body).unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(_)));
    }

    #[test]
    fn empty_weather_list_is_malformed() {
        let mut body = payload();
        body["weather"] = json!([]);
        let parsed = parse(StatusCode::OK, &body).expect("shape is valid");
        let err = normalize(&parsed, DistanceUnit::Miles, &Utc).unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(_)));
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = parse_current(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").unwrap_err();
        match err {
            WeatherError::Malformed(msg) => assert!(msg.contains("bad gateway")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn truncate_long_body() {
        let long = "x".repeat(500);
        let out = truncate_body(&long);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
