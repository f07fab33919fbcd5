use crate::{Config, Position, WeatherError, WeatherState, provider::openweather::OpenWeatherProvider};
use anyhow::Context;
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// A remote source of current conditions.
///
/// Implementations either return a complete, normalized [`WeatherState`] or an
/// error; they never hand back a partially filled record.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, position: Position) -> Result<WeatherState, WeatherError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `hourcast configure` or set HOURCAST_API_KEY."
        )
    })?;

    let provider = OpenWeatherProvider::new(api_key, &config.base_url, config.distance_unit)
        .context("Failed to build OpenWeather HTTP client")?;

    Ok(Arc::new(provider))
}
