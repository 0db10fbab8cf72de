use std::{pin::Pin, time::Duration};

use futures_util::future;
use tokio::time::{Instant, Sleep};

/// A one-shot timer that can be armed, re-armed and cancelled.
///
/// Cancelling drops the underlying sleep, so a cancelled timer can never fire later.
#[derive(Debug, Default)]
pub(crate) struct Timer {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Timer {
    pub fn arm(&mut self, after: Duration) {
        self.sleep = Some(Box::pin(tokio::time::sleep(after)));
    }

    /// Cancel the timer, returns true if it was armed
    pub fn cancel(&mut self) -> bool {
        self.sleep.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.sleep.as_ref().map(|s| s.deadline())
    }

    /// Wait until the timer fires, pending forever if not armed.
    ///
    /// Cancel safe: if the returned future is dropped early the timer keeps armed.
    pub async fn fired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.await;
                self.sleep = None;
            }
            None => future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fired_after_duration() {
        let start = Instant::now();
        let mut timer = Timer::default();

        timer.arm(Duration::from_millis(1500));
        assert!(timer.is_armed());

        timer.fired().await;

        assert!(start.elapsed() >= Duration::from_millis(1500));
        assert!(start.elapsed() < Duration::from_millis(1510));
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let mut timer = Timer::default();
        timer.arm(Duration::from_millis(10));

        assert!(timer.cancel());
        assert!(!timer.cancel());

        let fired = tokio::time::timeout(Duration::from_secs(60), timer.fired()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_deadline() {
        let start = Instant::now();
        let mut timer = Timer::default();

        timer.arm(Duration::from_secs(1));
        timer.arm(Duration::from_secs(5));

        assert_eq!(timer.deadline(), Some(start + Duration::from_secs(5)));
        timer.fired().await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
