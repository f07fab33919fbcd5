//! Resolving where the display is, once per poll cycle.
//! Any failure here is recoverable: the poller falls back to a fixed position.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{Config, LocationError, Position};

pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json/?fields=status,message,lat,lon";

const REQUEST_TIMEOUT_SECS: u64 = 5;

#[async_trait]
pub trait LocationResolver: Send + Sync + Debug {
    async fn resolve(&self) -> Result<Position, LocationError>;
}

/// Approximates the position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpLocator {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLocator {
    pub fn new(url: impl Into<String>) -> Result<Self, LocationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { url: url.into(), http })
    }
}

#[async_trait]
impl LocationResolver for IpLocator {
    async fn resolve(&self) -> Result<Position, LocationError> {
        let res = self.http.get(&self.url).send().await?;

        if !res.status().is_success() {
            tracing::debug!("IP lookup returned status {}", res.status());
            return Err(LocationError::ServiceUnavailable);
        }

        let body: IpLookupResponse = res.json().await?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(latitude), Some(longitude)) => Ok(Position { latitude, longitude }),
            _ => Err(LocationError::Other(
                body.message.unwrap_or_else(|| format!("lookup status {}", body.status)),
            )),
        }
    }
}

/// Stands in when geolocation is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocator;

#[async_trait]
impl LocationResolver for NoLocator {
    async fn resolve(&self) -> Result<Position, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

/// IP lookup when `geolocate` is on, otherwise straight to the fallback.
pub fn locator_from_config(config: &Config) -> Arc<dyn LocationResolver> {
    if !config.geolocate {
        return Arc::new(NoLocator);
    }
    match IpLocator::new(DEFAULT_IP_LOOKUP_URL) {
        Ok(locator) => Arc::new(locator),
        Err(e) => {
            tracing::warn!(error = %e, "IP geolocation unavailable, using fallback position");
            Arc::new(NoLocator)
        }
    }
}
