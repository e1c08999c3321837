//! Cancellable display ticker.
//!
//! Ticks only drive the elapsed-time display. They carry a running count and
//! never mutate sessions, so the front end must cancel the ticker before it
//! issues the next session transition.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

const TICK_BUFFER: usize = 8;

pub struct Ticker {
    task: Option<JoinHandle<()>>,
    rx: mpsc::Receiver<u64>,
}

impl Ticker {
    /// One tick per second. Must be called inside a tokio runtime.
    pub fn every_second() -> Self {
        Self::spawn(Duration::from_secs(1))
    }

    pub fn spawn(period: Duration) -> Self {
        let (tx, rx) = mpsc::channel(TICK_BUFFER);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // first tick completes immediately
            interval.tick().await;

            let mut count: u64 = 0;
            loop {
                interval.tick().await;
                count += 1;
                match tx.try_send(count) {
                    Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        });
        Self {
            task: Some(task),
            rx,
        }
    }

    /// Next tick count, or `None` once cancelled.
    pub async fn tick(&mut self) -> Option<u64> {
        self.rx.recv().await
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_none()
    }

    /// Stop the background task and discard undelivered ticks.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.rx.close();
            while self.rx.try_recv().is_ok() {}
            debug!("ticker cancelled");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_count_up_once_per_period() {
        let mut ticker = Ticker::every_second();
        assert_eq!(ticker.tick().await, Some(1));
        assert_eq!(ticker.tick().await, Some(2));
        assert_eq!(ticker.tick().await, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_delivery() {
        let mut ticker = Ticker::spawn(Duration::from_millis(10));
        assert_eq!(ticker.tick().await, Some(1));
        ticker.cancel();
        assert!(ticker.is_cancelled());
        assert_eq!(ticker.tick().await, None);
        // idempotent
        ticker.cancel();
    }
}
