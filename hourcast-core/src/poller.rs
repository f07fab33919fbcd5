//! Periodic weather refresh.
//!
//! A poll cycle resolves a position, asks the provider for current conditions
//! and, only if that produced a complete record, replaces the published
//! [`WeatherState`]. Every failure is logged and otherwise ignored, so
//! subscribers keep seeing the last good state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::location::LocationResolver;
use crate::provider::WeatherProvider;
use crate::scheduler::{self, FirstTick, TimerHandle};
use crate::{Position, WeatherError, WeatherState};

/// Everything the poller needs besides its collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollerConfig {
    pub fallback: Position,
    pub period: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            fallback: Position::default(),
            period: Duration::from_secs(300),
        }
    }
}

/// What one poll cycle did to the weather state.
#[derive(Debug)]
pub enum PollOutcome {
    Updated,
    Kept(WeatherError),
}

#[derive(Debug, Clone)]
pub struct WeatherPoller {
    config: PollerConfig,
    provider: Arc<dyn WeatherProvider>,
    locator: Arc<dyn LocationResolver>,
    state: Arc<watch::Sender<WeatherState>>,
}

impl WeatherPoller {
    pub fn new(
        config: PollerConfig,
        provider: Arc<dyn WeatherProvider>,
        locator: Arc<dyn LocationResolver>,
    ) -> Self {
        let (tx, _) = watch::channel(WeatherState::placeholder());
        Self {
            config,
            provider,
            locator,
            state: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> WeatherState {
        self.state.borrow().clone()
    }

    async fn position(&self) -> Position {
        match self.locator.resolve().await {
            Ok(position) => {
                tracing::info!(
                    latitude = position.latitude,
                    longitude = position.longitude,
                    "Location resolved"
                );
                position
            }
            Err(e) => {
                tracing::info!(
                    error = %e,
                    latitude = self.config.fallback.latitude,
                    longitude = self.config.fallback.longitude,
                    "Location unavailable, using fallback"
                );
                self.config.fallback
            }
        }
    }

    /// Runs one full cycle. Never fails: errors come back as
    /// [`PollOutcome::Kept`] after being logged.
    pub async fn poll_once(&self) -> PollOutcome {
        let position = self.position().await;

        match self.provider.current(position).await {
            Ok(state) => {
                tracing::info!(
                    conditions = %state.conditions,
                    temperature = state.temperature,
                    "Weather updated"
                );
                self.state.send_replace(state);
                PollOutcome::Updated
            }
            Err(WeatherError::Unauthorized) => {
                tracing::warn!(
                    "API key not active yet (new keys can take 10-15 minutes); keeping current weather"
                );
                PollOutcome::Kept(WeatherError::Unauthorized)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Weather fetch failed; keeping current weather");
                PollOutcome::Kept(e)
            }
        }
    }

    /// Polls now and then every period until `parent` or the handle is
    /// cancelled.
    pub fn spawn(&self, parent: &CancellationToken) -> TimerHandle {
        let poller = self.clone();
        scheduler::every(parent, self.config.period, FirstTick::Immediately, move || {
            let poller = poller.clone();
            async move {
                poller.poll_once().await;
            }
        })
    }
}
