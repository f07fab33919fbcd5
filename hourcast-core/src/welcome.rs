use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::scheduler::{self, TimerHandle};

/// Holds the splash screen up for a fixed time after mount, then opens for
/// good.
#[derive(Debug)]
pub struct WelcomeGate {
    timer: TimerHandle,
    // Outlives the timer so subscribers never see the channel close.
    tx: Arc<watch::Sender<bool>>,
}

impl WelcomeGate {
    pub fn start(parent: &CancellationToken, duration: Duration) -> Self {
        let tx = Arc::new(watch::Sender::new(false));
        let opener = tx.clone();
        let timer = scheduler::after(parent, duration, move || {
            opener.send_replace(true);
        });
        Self { timer, tx }
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn cancel(&self) {
        self.timer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn opens_after_one_second_and_stays_open() {
        let root = CancellationToken::new();
        let gate = WelcomeGate::start(&root, Duration::from_secs(1));
        assert!(!gate.is_open());

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(!gate.is_open());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(gate.is_open());

        tokio::time::sleep(Duration::from_secs(3_600)).await;
        assert!(gate.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_gate_stays_closed() {
        let root = CancellationToken::new();
        let gate = WelcomeGate::start(&root, Duration::from_secs(1));
        gate.cancel();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!gate.is_open());
    }
}
