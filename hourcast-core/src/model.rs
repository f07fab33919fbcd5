use serde::{Deserialize, Serialize};

/// Geographic coordinates used for one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    /// New Delhi, India.
    pub const NEW_DELHI: Position = Position { latitude: 28.6139, longitude: 77.2090 };
}

impl Default for Position {
    fn default() -> Self {
        Self::NEW_DELHI
    }
}

/// Unit the visibility readout is converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Miles,
    Kilometers,
}

impl DistanceUnit {
    pub fn metres_per_unit(&self) -> f64 {
        match self {
            DistanceUnit::Miles => 1609.34,
            DistanceUnit::Kilometers => 1000.0,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            DistanceUnit::Miles => "mi",
            DistanceUnit::Kilometers => "km",
        }
    }

    /// Converts metres into this unit, rounded to the nearest whole unit.
    pub fn convert_metres(&self, metres: f64) -> i64 {
        (metres / self.metres_per_unit()).round() as i64
    }
}

/// Display-ready snapshot of current conditions.
///
/// Replaced wholesale on each successful fetch; never partially merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherState {
    pub temperature: i64,
    pub feels_like: i64,
    pub humidity: i64,
    pub high: i64,
    pub low: i64,
    /// Category string as reported by the provider, e.g. "Rain".
    pub conditions: String,
    pub description: String,
    pub wind_speed: i64,
    pub visibility: i64,
    pub sunrise: String,
    pub sunset: String,
    pub day_length: String,
}

impl WeatherState {
    /// Shown until the first successful fetch.
    pub fn placeholder() -> Self {
        Self {
            temperature: 72,
            feels_like: 70,
            humidity: 65,
            high: 78,
            low: 64,
            conditions: "Clear".to_string(),
            description: "Clear skies".to_string(),
            wind_speed: 8,
            visibility: 10,
            sunrise: "6:42 AM".to_string(),
            sunset: "7:06 PM".to_string(),
            day_length: "12h 24m".to_string(),
        }
    }
}

impl Default for WeatherState {
    fn default() -> Self {
        Self::placeholder()
    }
}
