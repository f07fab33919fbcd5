//! Timers with their own cancellation.
//!
//! Every repeating or one-shot job in the display is a spawned task that races
//! its next deadline against a [`CancellationToken`]. Cancelling a
//! [`TimerHandle`] stops the task before its next callback; cancelling twice
//! is a no-op.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Owns a running timer task.
#[derive(Debug)]
pub struct TimerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once the task has returned, either cancelled or (for one-shot
    /// timers) after firing.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// When the first callback of a repeating timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstTick {
    Immediately,
    AfterPeriod,
}

/// Runs `job` every `period` until the returned handle (or `parent`) is
/// cancelled. A callback in flight when cancellation arrives is dropped at its
/// next await point.
pub fn every<F, Fut>(
    parent: &CancellationToken,
    period: Duration,
    first: FirstTick,
    mut job: F,
) -> TimerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let token = parent.child_token();
    let cancelled = token.clone();

    let task = tokio::spawn(async move {
        let start = match first {
            FirstTick::Immediately => Instant::now(),
            FirstTick::AfterPeriod => Instant::now() + period,
        };
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = cancelled.cancelled() => break,
                        _ = job() => {}
                    }
                }
            }
        }
    });

    TimerHandle { token, task }
}

/// Runs `job` once after `delay` unless cancelled first.
pub fn after<F>(parent: &CancellationToken, delay: Duration, job: F) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    let token = parent.child_token();
    let cancelled = token.clone();

    let task = tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = cancelled.cancelled() => {}
            _ = tokio::time::sleep(delay) => job(),
        }
    });

    TimerHandle { token, task }
}

/// Spawns a long-lived task that watches its own token, for jobs driven by
/// state changes rather than a fixed period.
pub fn supervise<F, Fut>(parent: &CancellationToken, job: F) -> TimerHandle
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let token = parent.child_token();
    let task = tokio::spawn(job(token.clone()));
    TimerHandle { token, task }
}
