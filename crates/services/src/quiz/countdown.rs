use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// One elapsed countdown period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

/// Repeating ticker task, cancelled on `cancel` or drop.
///
/// The first tick arrives one full period after `start`.
#[derive(Debug)]
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Spawn the ticker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start(period: Duration) -> (Self, mpsc::Receiver<Tick>) {
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(Tick).await.is_err() {
                    break;
                }
            }
        });
        (Self { handle }, rx)
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let started = Instant::now();
        let (countdown, mut rx) = Countdown::start(Duration::from_secs(1));

        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(Tick));
        }
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert!(countdown.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_closes_the_channel() {
        let (countdown, mut rx) = Countdown::start(Duration::from_secs(1));
        assert_eq!(rx.recv().await, Some(Tick));

        countdown.cancel();
        while rx.recv().await.is_some() {}
        tokio::task::yield_now().await;
        assert!(!countdown.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_the_ticker() {
        let (countdown, mut rx) = Countdown::start(Duration::from_secs(1));
        drop(countdown);
        while rx.recv().await.is_some() {}
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_receiver_ends_the_task() {
        let (countdown, rx) = Countdown::start(Duration::from_millis(10));
        drop(rx);
        time::sleep(Duration::from_millis(50)).await;
        assert!(!countdown.is_running());
    }
}
