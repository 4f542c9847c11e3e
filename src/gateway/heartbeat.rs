use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

/// Fallback when the hello frame carries no usable interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(45);

/// Cancellable periodic liveness pulse. At most one exists per connection.
///
/// The timer only emits ticks; the connection builds the heartbeat frame so
/// the sequence number is read from a single place. The first tick is jittered
/// across the interval so a fleet of fresh connections does not beat in step.
pub struct HeartbeatTimer {
    handle: JoinHandle<()>,
}

impl HeartbeatTimer {
    pub fn start(interval: Duration, ticks: mpsc::UnboundedSender<()>) -> Self {
        let handle = tokio::spawn(async move {
            let jitter = interval.mul_f64(rand::random::<f64>());
            let mut ticker = interval_at(Instant::now() + jitter, interval);
            loop {
                ticker.tick().await;
                if ticks.send(()).is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for HeartbeatTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_at_the_configured_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = HeartbeatTimer::start(Duration::from_millis(50), tx);
        // first tick lands within one jittered interval, then steady cadence
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        timer.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_all_further_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = HeartbeatTimer::start(Duration::from_millis(20), tx);
        rx.recv().await.unwrap();
        timer.cancel();
        // drain anything that raced the abort, then the channel must close
        while let Ok(()) = rx.try_recv() {}
        assert!(rx.recv().await.is_none(), "timer kept ticking after cancel");
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timer_aborts_its_task() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        {
            let _timer = HeartbeatTimer::start(Duration::from_millis(20), tx);
            rx.recv().await.unwrap();
        }
        while let Ok(()) = rx.try_recv() {}
        assert!(rx.recv().await.is_none());
    }
}
