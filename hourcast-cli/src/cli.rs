use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hourcast_core::{
    Config, Dashboard, DashboardView, DistanceUnit, SystemTime, TimeSource, View, WeatherPoller,
    locator_from_config, provider_from_config,
};
use inquire::{Confirm, Select, Text};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "hourcast", version, about = "Clock, calendar and weather in your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the OpenWeather API key and location preferences.
    Configure,

    /// Fetch the weather once and print a single frame.
    Show,

    /// Keep the display running until Ctrl-C.
    Watch {
        /// Seed for the decorative animation parameters; random if absent.
        #[arg(long)]
        seed: Option<u64>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show => show().await,
            Command::Watch { seed } => watch(seed).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load_stored()?;

    let mut key_prompt = Text::new("OpenWeather API key:");
    if let Some(existing) = config.api_key() {
        key_prompt = key_prompt.with_default(existing);
    }
    let api_key = key_prompt.prompt().context("Failed to read API key")?;

    let units = vec!["miles", "kilometers"];
    let start = match config.distance_unit {
        DistanceUnit::Miles => 0,
        DistanceUnit::Kilometers => 1,
    };
    let unit = Select::new("Visibility unit:", units)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read visibility unit")?;

    let geolocate = Confirm::new("Look up your position from your IP address?")
        .with_default(config.geolocate)
        .prompt()
        .context("Failed to read geolocation preference")?;

    config.api_key = Some(api_key.trim().to_string());
    config.distance_unit = if unit == "kilometers" {
        DistanceUnit::Kilometers
    } else {
        DistanceUnit::Miles
    };
    config.geolocate = geolocate;

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

async fn show() -> anyhow::Result<()> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    let poller = WeatherPoller::new(config.poller(), provider, locator_from_config(&config));

    poller.poll_once().await;

    let view = DashboardView::at(SystemTime.now(), poller.current(), false);
    print!("{}", render::frame(&view, config.distance_unit));
    Ok(())
}

async fn watch(seed: Option<u64>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    let seed = seed.unwrap_or_else(|| u64::from(chrono::Utc::now().timestamp_subsec_nanos()));
    tracing::debug!(seed, "Starting watch");

    let mut dashboard = Dashboard::mount(
        &config,
        provider,
        locator_from_config(&config),
        Arc::new(SystemTime),
        seed,
    );

    let mut stdout = std::io::stdout();
    redraw_until(
        &mut dashboard,
        tokio::signal::ctrl_c(),
        &mut stdout,
        config.distance_unit,
    )
    .await?;

    dashboard.unmount();
    Ok(())
}

/// Draws now and after every change until `shutdown` resolves or the
/// dashboard is unmounted. `shutdown` is created once and polled across
/// redraws, so a signal that lands mid-draw is still seen.
async fn redraw_until<S>(
    dashboard: &mut Dashboard,
    shutdown: S,
    out: &mut impl Write,
    unit: DistanceUnit,
) -> anyhow::Result<()>
where
    S: Future,
{
    tokio::pin!(shutdown);
    draw(out, dashboard, unit)?;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Interrupted, unmounting");
                break;
            }
            changed = dashboard.changed() => {
                if !changed {
                    break;
                }
                draw(out, dashboard, unit)?;
            }
        }
    }

    Ok(())
}

fn draw(out: &mut impl Write, dashboard: &Dashboard, unit: DistanceUnit) -> anyhow::Result<()> {
    let body = match dashboard.view() {
        View::Welcome => render::welcome(),
        View::Main(view) => {
            let mut text = render::frame(&view, unit);
            text.push_str(&render::ambient(&dashboard.ambient()));
            text
        }
    };

    write!(out, "{}{}", render::CLEAR, body).context("Failed to write frame")?;
    out.flush().context("Failed to flush frame")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hourcast_core::{NoLocator, Position, WeatherError, WeatherProvider, WeatherState};
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[derive(Debug)]
    struct Offline;

    #[async_trait]
    impl WeatherProvider for Offline {
        async fn current(&self, _position: Position) -> Result<WeatherState, WeatherError> {
            Err(WeatherError::Unauthorized)
        }
    }

    fn mount() -> Dashboard {
        Dashboard::mount(
            &Config::default(),
            Arc::new(Offline),
            Arc::new(NoLocator),
            Arc::new(SystemTime),
            7,
        )
    }

    fn frames(out: &[u8]) -> usize {
        String::from_utf8_lossy(out).matches(render::CLEAR).count()
    }

    #[tokio::test(start_paused = true)]
    async fn redraws_until_interrupted() {
        let mut dashboard = mount();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            let _ = tx.send(());
        });

        let mut out = Vec::new();
        redraw_until(&mut dashboard, rx, &mut out, DistanceUnit::Miles)
            .await
            .expect("redraw");

        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("H O U R C A S T"));
        assert!(text.contains("HOURCAST"));
        assert!(frames(&out) >= 3);
        assert!(dashboard.is_mounted());
    }

    #[tokio::test(start_paused = true)]
    async fn signal_already_delivered_stops_after_one_frame() {
        let mut dashboard = mount();
        let mut out = Vec::new();
        redraw_until(&mut dashboard, std::future::ready(()), &mut out, DistanceUnit::Miles)
            .await
            .expect("redraw");
        assert_eq!(frames(&out), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unmounted_dashboard_ends_the_loop() {
        let mut dashboard = mount();
        dashboard.unmount();
        let mut out = Vec::new();
        redraw_until(
            &mut dashboard,
            std::future::pending::<()>(),
            &mut out,
            DistanceUnit::Miles,
        )
        .await
        .expect("redraw");
        assert_eq!(frames(&out), 1);
    }
}
