//! Decorative background keyed off the weather condition.
//!
//! The per-element parameters (positions, speeds, delays) are drawn once per
//! mount from a seeded generator and then held for the life of the display.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::WeatherState;
use crate::scheduler::{self, FirstTick, TimerHandle};

const RAINDROPS: usize = 80;
const SNOWFLAKES: usize = 40;
const FOG_LAYERS: usize = 3;
const CLOUDS: usize = 5;
const STARS: usize = 50;

pub const THUNDERSTORM: &str = "Thunderstorm";

/// Which overlay a condition category gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmbientKind {
    None,
    Rain,
    Snow,
    Fog,
    Clouds,
    /// Rain plus lightning flashes.
    Thunderstorm,
}

impl AmbientKind {
    /// Exact, case-sensitive match on the provider's category string.
    pub fn select(conditions: &str) -> Self {
        match conditions {
            "Rain" | "Drizzle" => AmbientKind::Rain,
            "Snow" => AmbientKind::Snow,
            "Fog" | "Mist" | "Haze" => AmbientKind::Fog,
            THUNDERSTORM => AmbientKind::Thunderstorm,
            "Clouds" => AmbientKind::Clouds,
            _ => AmbientKind::None,
        }
    }

    pub fn has_rain(&self) -> bool {
        matches!(self, AmbientKind::Rain | AmbientKind::Thunderstorm)
    }

    pub fn has_lightning(&self) -> bool {
        matches!(self, AmbientKind::Thunderstorm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Raindrop {
    pub left_pct: f64,
    pub duration_secs: f64,
    pub delay_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snowflake {
    pub left_pct: f64,
    pub fall_secs: f64,
    pub sway_secs: f64,
    pub delay_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cloud {
    pub top_pct: f64,
    pub drift_secs: f64,
    pub delay_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StarSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub size: StarSize,
    pub left_pct: f64,
    pub top_pct: f64,
    pub twinkle_secs: f64,
    pub delay_secs: f64,
}

/// Every decorative element the display can show, fixed at mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientScene {
    pub raindrops: Vec<Raindrop>,
    pub snowflakes: Vec<Snowflake>,
    pub fog_layers: usize,
    pub clouds: Vec<Cloud>,
    pub stars: Vec<Star>,
}

fn between<R: Rng + ?Sized>(rng: &mut R, range: Range<f64>) -> f64 {
    rng.random_range(range)
}

impl AmbientScene {
    pub fn from_seed(seed: u64) -> Self {
        Self::generate(&mut StdRng::seed_from_u64(seed))
    }

    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let raindrops = (0..RAINDROPS)
            .map(|_| Raindrop {
                left_pct: between(rng, 0.0..100.0),
                duration_secs: between(rng, 0.5..1.0),
                delay_secs: between(rng, 0.0..2.0),
            })
            .collect();

        let snowflakes = (0..SNOWFLAKES)
            .map(|_| Snowflake {
                left_pct: between(rng, 0.0..100.0),
                fall_secs: between(rng, 3.0..5.0),
                delay_secs: between(rng, 0.0..5.0),
                sway_secs: between(rng, 2.0..4.0),
            })
            .collect();

        let clouds = (0..CLOUDS)
            .map(|_| Cloud {
                top_pct: between(rng, 0.0..60.0),
                drift_secs: between(rng, 40.0..60.0),
                delay_secs: between(rng, 0.0..20.0),
            })
            .collect();

        let stars = (0..STARS)
            .map(|_| {
                let size = if rng.random::<f64>() > 0.7 {
                    StarSize::Large
                } else if rng.random::<f64>() > 0.4 {
                    StarSize::Medium
                } else {
                    StarSize::Small
                };
                Star {
                    size,
                    left_pct: between(rng, 0.0..100.0),
                    top_pct: between(rng, 0.0..100.0),
                    twinkle_secs: between(rng, 4.0..10.0),
                    delay_secs: between(rng, 0.0..8.0),
                }
            })
            .collect();

        Self {
            raindrops,
            snowflakes,
            fog_layers: FOG_LAYERS,
            clouds,
            stars,
        }
    }

    /// The layers to draw for `kind`. Stars are always present.
    pub fn compose(&self, kind: AmbientKind, flash_visible: bool) -> Composition<'_> {
        Composition {
            stars: &self.stars,
            rain: kind.has_rain().then_some(self.raindrops.as_slice()),
            snow: (kind == AmbientKind::Snow).then_some(self.snowflakes.as_slice()),
            fog_layers: if kind == AmbientKind::Fog { self.fog_layers } else { 0 },
            clouds: (kind == AmbientKind::Clouds).then_some(self.clouds.as_slice()),
            lightning_flash: kind.has_lightning() && flash_visible,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Composition<'a> {
    pub stars: &'a [Star],
    pub rain: Option<&'a [Raindrop]>,
    pub snow: Option<&'a [Snowflake]>,
    pub fog_layers: usize,
    pub clouds: Option<&'a [Cloud]>,
    pub lightning_flash: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightningTimings {
    pub min_period: Duration,
    pub max_period: Duration,
    pub flash: Duration,
}

impl Default for LightningTimings {
    fn default() -> Self {
        Self {
            min_period: Duration::from_secs(5),
            max_period: Duration::from_secs(10),
            flash: Duration::from_millis(200),
        }
    }
}

/// Flashes while the weather reports a thunderstorm.
///
/// A storm episode picks one period in `min_period..=max_period` and flashes
/// on that beat; each flash stays visible for `flash`. Leaving the
/// thunderstorm condition stops the beat and hides the flash.
#[derive(Debug)]
pub struct LightningFlasher {
    supervisor: TimerHandle,
    rx: watch::Receiver<bool>,
}

impl LightningFlasher {
    pub fn start(
        parent: &CancellationToken,
        mut weather: watch::Receiver<WeatherState>,
        timings: LightningTimings,
        mut rng: StdRng,
    ) -> Self {
        let (tx, rx) = watch::channel(false);
        let tx = Arc::new(tx);

        let supervisor = scheduler::supervise(parent, move |token| async move {
            let mut storm: Option<TimerHandle> = None;

            loop {
                let thundering = weather.borrow_and_update().conditions == THUNDERSTORM;

                if thundering && storm.is_none() {
                    let period = pick_period(&mut rng, timings);
                    tracing::debug!(period_ms = period.as_millis() as u64, "Thunderstorm started");
                    storm = Some(flash_on_beat(&token, period, timings.flash, tx.clone()));
                } else if !thundering {
                    if let Some(beat) = storm.take() {
                        tracing::debug!("Thunderstorm ended");
                        beat.cancel();
                        tx.send_replace(false);
                    }
                }

                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    changed = weather.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            if let Some(beat) = storm {
                beat.cancel();
            }
            tx.send_replace(false);
        });

        Self { supervisor, rx }
    }

    pub fn is_flashing(&self) -> bool {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }

    pub fn stop(&self) {
        self.supervisor.cancel();
    }
}

fn pick_period(rng: &mut StdRng, timings: LightningTimings) -> Duration {
    let min = timings.min_period.as_millis() as u64;
    let max = (timings.max_period.as_millis() as u64).max(min);
    Duration::from_millis(rng.random_range(min..=max))
}

fn flash_on_beat(
    parent: &CancellationToken,
    period: Duration,
    flash: Duration,
    tx: Arc<watch::Sender<bool>>,
) -> TimerHandle {
    scheduler::every(parent, period, FirstTick::AfterPeriod, move || {
        let tx = tx.clone();
        async move {
            tx.send_replace(true);
            tokio::time::sleep(flash).await;
            tx.send_replace(false);
        }
    })
}
