//! The mounted display: one owner for every timer and every piece of state.
//!
//! Mounting starts four independent jobs (clock tick, weather poll, welcome
//! gate, lightning beat) under one root [`CancellationToken`]. Each job is
//! the only writer of its own `watch` channel; the dashboard only reads.
//! Unmounting, or dropping the dashboard, cancels the root.

use std::sync::Arc;

use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::ambient::{AmbientKind, AmbientScene, Composition, LightningFlasher};
use crate::calendar::{self, ClockFace, Season, TimeRemaining, WeekProgress};
use crate::clock::{ClockTicker, TimeSource};
use crate::location::LocationResolver;
use crate::poller::WeatherPoller;
use crate::provider::WeatherProvider;
use crate::scheduler::TimerHandle;
use crate::welcome::WelcomeGate;
use crate::{Config, WeatherState};

/// What the display should show right now.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Welcome,
    Main(Box<DashboardView>),
}

/// Every readout of the main view, computed from one timestamp and one
/// weather snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub now: NaiveDateTime,
    pub face: ClockFace,
    pub greeting: &'static str,
    pub week: WeekProgress,
    pub day_of_year: u32,
    pub time_left: TimeRemaining,
    pub day_progress: u32,
    pub season: Season,
    pub days_until_spring: i64,
    pub month_progress: u32,
    pub days_left_in_month: u32,
    pub weather: WeatherState,
    pub ambient: AmbientKind,
    pub lightning_flash: bool,
}

impl DashboardView {
    pub fn at(now: NaiveDateTime, weather: WeatherState, flash: bool) -> Self {
        let ambient = AmbientKind::select(&weather.conditions);
        Self {
            now,
            face: ClockFace::at(now),
            greeting: calendar::greeting(now),
            week: calendar::week_progress(now),
            day_of_year: calendar::day_of_year(now),
            time_left: calendar::time_remaining_today(now),
            day_progress: calendar::day_progress(now),
            season: calendar::season(now),
            days_until_spring: calendar::days_until_spring(now),
            month_progress: calendar::month_progress(now),
            days_left_in_month: calendar::days_left_in_month(now),
            lightning_flash: ambient.has_lightning() && flash,
            ambient,
            weather,
        }
    }
}

pub struct Dashboard {
    root: CancellationToken,
    clock: ClockTicker,
    poller: WeatherPoller,
    poll_timer: TimerHandle,
    welcome: WelcomeGate,
    lightning: LightningFlasher,
    scene: AmbientScene,
    clock_rx: watch::Receiver<NaiveDateTime>,
    weather_rx: watch::Receiver<WeatherState>,
    gate_rx: watch::Receiver<bool>,
    flash_rx: watch::Receiver<bool>,
}

impl Dashboard {
    /// Starts every timer. Must be called from inside a Tokio runtime.
    ///
    /// `seed` fixes the decorative parameters and the lightning rhythm for
    /// this mount.
    pub fn mount(
        config: &Config,
        provider: Arc<dyn WeatherProvider>,
        locator: Arc<dyn LocationResolver>,
        time: Arc<dyn TimeSource>,
        seed: u64,
    ) -> Self {
        let root = CancellationToken::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let scene = AmbientScene::generate(&mut rng);
        let lightning_rng = StdRng::seed_from_u64(rng.random());

        let clock = ClockTicker::start(&root, time, config.timings.tick());
        let poller = WeatherPoller::new(config.poller(), provider, locator);
        let poll_timer = poller.spawn(&root);
        let welcome = WelcomeGate::start(&root, config.timings.welcome());
        let lightning = LightningFlasher::start(
            &root,
            poller.subscribe(),
            config.timings.lightning(),
            lightning_rng,
        );

        tracing::info!(seed, "Dashboard mounted");

        Self {
            clock_rx: clock.subscribe(),
            weather_rx: poller.subscribe(),
            gate_rx: welcome.subscribe(),
            flash_rx: lightning.subscribe(),
            root,
            clock,
            poller,
            poll_timer,
            welcome,
            lightning,
            scene,
        }
    }

    pub fn view(&self) -> View {
        if !self.welcome.is_open() {
            return View::Welcome;
        }
        View::Main(Box::new(DashboardView::at(
            self.clock.now(),
            self.poller.current(),
            self.lightning.is_flashing(),
        )))
    }

    pub fn weather(&self) -> WeatherState {
        self.poller.current()
    }

    /// The decorative layers for the current weather.
    pub fn ambient(&self) -> Composition<'_> {
        let kind = AmbientKind::select(&self.weather_rx.borrow().conditions);
        self.scene.compose(kind, self.lightning.is_flashing())
    }

    pub fn scene(&self) -> &AmbientScene {
        &self.scene
    }

    /// Waits until anything visible may have changed. Returns `false` once
    /// the dashboard is unmounted.
    pub async fn changed(&mut self) -> bool {
        if self.root.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.root.cancelled() => false,
            r = self.gate_rx.changed() => r.is_ok(),
            r = self.weather_rx.changed() => r.is_ok(),
            r = self.flash_rx.changed() => r.is_ok(),
            r = self.clock_rx.changed() => r.is_ok(),
        }
    }

    pub fn is_mounted(&self) -> bool {
        !self.root.is_cancelled()
    }

    /// Cancels every timer through the shared root token. Safe to call more
    /// than once.
    pub fn unmount(&self) {
        if self.root.is_cancelled() {
            return;
        }
        self.root.cancel();
        tracing::info!("Dashboard unmounted");
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("mounted", &self.is_mounted())
            .field("welcome_open", &self.welcome.is_open())
            .field("polling", &!self.poll_timer.is_finished())
            .finish_non_exhaustive()
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::tests::{SteppingTime, noon};
    use crate::{LocationError, Position, WeatherError};
    use async_trait::async_trait;
    use chrono::TimeDelta;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct StormProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherProvider for StormProvider {
        async fn current(&self, _position: Position) -> Result<WeatherState, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(WeatherState {
                conditions: "Thunderstorm".to_string(),
                description: "thunderstorm with rain".to_string(),
                ..WeatherState::placeholder()
            })
        }
    }

    #[derive(Debug)]
    struct Denied;

    #[async_trait]
    impl LocationResolver for Denied {
        async fn resolve(&self) -> Result<Position, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    fn mount(provider: Arc<StormProvider>) -> Dashboard {
        Dashboard::mount(
            &Config::default(),
            provider,
            Arc::new(Denied),
            Arc::new(SteppingTime::new(noon())),
            42,
        )
    }

    fn main_view(dashboard: &Dashboard) -> DashboardView {
        match dashboard.view() {
            View::Main(view) => *view,
            View::Welcome => panic!("welcome gate still closed"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn welcome_then_main_forever() {
        let dashboard = mount(Arc::new(StormProvider::default()));
        assert_eq!(dashboard.view(), View::Welcome);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(dashboard.view(), View::Welcome);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(matches!(dashboard.view(), View::Main(_)));

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(matches!(dashboard.view(), View::Main(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn main_view_carries_weather_and_clock() {
        let dashboard = mount(Arc::new(StormProvider::default()));
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        let view = main_view(&dashboard);
        assert_eq!(view.weather.conditions, "Thunderstorm");
        assert_eq!(view.ambient, AmbientKind::Thunderstorm);
        assert_eq!(view.now, noon() + TimeDelta::seconds(2));
        assert_eq!(view.greeting, "Good Afternoon");
        assert_eq!(view.season, Season::Summer);
        assert!(dashboard.ambient().rain.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn lightning_flashes_while_mounted() {
        let mut dashboard = mount(Arc::new(StormProvider::default()));

        let mut flashed = false;
        let deadline = tokio::time::Instant::now() + Duration::from_secs(12);
        while tokio::time::Instant::now() < deadline && dashboard.changed().await {
            if dashboard.ambient().lightning_flash {
                flashed = true;
                break;
            }
        }
        assert!(flashed);
    }

    #[tokio::test(start_paused = true)]
    async fn scene_is_fixed_for_the_mount() {
        let dashboard = mount(Arc::new(StormProvider::default()));
        let before = dashboard.scene().clone();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(dashboard.scene(), &before);
        assert_eq!(&before, &AmbientScene::generate(&mut StdRng::seed_from_u64(42)));
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_stops_everything_and_is_idempotent() {
        let provider = Arc::new(StormProvider::default());
        let mut dashboard = mount(provider.clone());
        tokio::time::sleep(Duration::from_secs(2)).await;

        dashboard.unmount();
        dashboard.unmount();
        assert!(!dashboard.is_mounted());
        assert!(dashboard.poll_timer.is_cancelled());
        assert!(!dashboard.changed().await);

        let frozen = main_view(&dashboard).now;
        let polls = provider.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(900)).await;

        assert_eq!(main_view(&dashboard).now, frozen);
        assert_eq!(provider.calls.load(Ordering::SeqCst), polls);
        assert!(dashboard.poll_timer.is_finished());
        assert!(!dashboard.ambient().lightning_flash);
    }

    #[test]
    fn view_derives_every_readout() {
        let view = DashboardView::at(noon(), WeatherState::placeholder(), true);
        assert_eq!(view.face.hour, 12);
        assert_eq!(view.face.meridiem, "PM");
        assert_eq!(view.day_progress, 50);
        assert_eq!(view.time_left.to_string(), "11h 59m");
        assert_eq!(view.month_progress, 3);
        assert_eq!(view.days_left_in_month, 29);
        assert_eq!(view.day_of_year, 152);
        assert_eq!(view.ambient, AmbientKind::None);
        // Clear skies never flash, whatever the flasher reports.
        assert!(!view.lightning_flash);
    }
}
