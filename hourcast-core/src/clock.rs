use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::scheduler::{self, FirstTick, TimerHandle};

/// Where the ticker reads wall-clock time from.
pub trait TimeSource: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

/// The machine's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

impl TimeSource for SystemTime {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Publishes the current time once per tick.
#[derive(Debug)]
pub struct ClockTicker {
    timer: TimerHandle,
    rx: watch::Receiver<NaiveDateTime>,
}

impl ClockTicker {
    pub fn start(
        parent: &CancellationToken,
        source: Arc<dyn TimeSource>,
        period: Duration,
    ) -> Self {
        let (tx, rx) = watch::channel(source.now());

        let timer = scheduler::every(parent, period, FirstTick::AfterPeriod, move || {
            tx.send_replace(source.now());
            std::future::ready(())
        });

        Self { timer, rx }
    }

    pub fn now(&self) -> NaiveDateTime {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<NaiveDateTime> {
        self.rx.clone()
    }

    pub fn stop(&self) {
        self.timer.cancel();
    }
}
