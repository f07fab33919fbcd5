//! Core library for the `hourcast` clock and weather display.
//!
//! This crate defines:
//! - The clock ticker and the calendar readouts derived from it
//! - Weather polling with a geolocation fallback, over a provider abstraction
//! - Ambient animation selection and the lightning beat
//! - The welcome gate and the timer abstraction everything runs on
//! - Configuration handling
//!
//! Drawing is left to the caller: [`Dashboard::view`] returns plain data.

pub mod ambient;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod location;
pub mod model;
pub mod poller;
pub mod provider;
pub mod scheduler;
pub mod welcome;

pub use ambient::{AmbientKind, AmbientScene};
pub use clock::{SystemTime, TimeSource};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardView, View};
pub use error::{LocationError, WeatherError};
pub use location::{IpLocator, LocationResolver, NoLocator, locator_from_config};
pub use model::{DistanceUnit, Position, WeatherState};
pub use poller::{PollOutcome, WeatherPoller};
pub use provider::{WeatherProvider, provider_from_config};
