use std::time::Duration;

/// Default first reconnect delay
pub const RECONNECT_INITIAL_DELAY: Duration = Duration::from_millis(1000);
/// Default reconnect delay upper bound
pub const RECONNECT_MAX_DELAY: Duration = Duration::from_millis(30000);
/// Default reconnect delay multiplier
pub const RECONNECT_BACKOFF_MULTIPLIER: u32 = 2;
/// Default reconnect attempts before give up
pub const RECONNECT_MAX_ATTEMPTS: u32 = 10;
/// Default interval between two ping messages
pub const PING_INTERVAL: Duration = Duration::from_millis(30000);
/// Default time to wait pong after a ping is sent
pub const PONG_TIMEOUT: Duration = Duration::from_millis(10000);

/// Reconnect policy, exponential backoff with a bounded attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// delay before first reconnect attempt
    pub initial_delay: Duration,
    /// upper bound of reconnect delay
    pub max_delay: Duration,
    /// delay is multiplied by this after every attempt
    pub backoff_multiplier: u32,
    /// attempts before client moves to failed state
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: RECONNECT_INITIAL_DELAY,
            max_delay: RECONNECT_MAX_DELAY,
            backoff_multiplier: RECONNECT_BACKOFF_MULTIPLIER,
            max_attempts: RECONNECT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Set delay before first reconnect attempt
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set upper bound of reconnect delay
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set backoff multiplier
    pub fn backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Set attempts before give up
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Delay before the reconnect following the `n`-th (0-indexed) consecutive failure,
    /// `min(initial_delay * backoff_multiplier ^ n, max_delay)`.
    pub fn delay_for(&self, n: u32) -> Duration {
        (0..n).fold(self.initial_delay.min(self.max_delay), |delay, _| {
            self.next_delay(delay)
        })
    }

    pub(crate) fn next_delay(&self, delay: Duration) -> Duration {
        delay
            .checked_mul(self.backoff_multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Application level ping/pong heartbeat timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// interval between two ping messages
    pub interval: Duration,
    /// time to wait pong after a ping is sent
    pub timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: PING_INTERVAL,
            timeout: PONG_TIMEOUT,
        }
    }
}

impl HeartbeatConfig {
    /// Set ping interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set pong timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// reconnect policy
    pub reconnect: ReconnectPolicy,
    /// heartbeat timing
    pub heartbeat: HeartbeatConfig,
}

impl ClientConfig {
    /// Set reconnect policy
    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Set heartbeat timing
    pub fn heartbeat(mut self, heartbeat: HeartbeatConfig) -> Self {
        self.heartbeat = heartbeat;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_delays() {
        let policy = ReconnectPolicy::default();

        let delays: Vec<_> = (0..10).map(|n| policy.delay_for(n).as_millis()).collect();

        assert_eq!(
            delays,
            vec![1000, 2000, 4000, 8000, 16000, 30000, 30000, 30000, 30000, 30000]
        );
    }

    #[test]
    fn test_delay_never_overflows() {
        let policy = ReconnectPolicy::default().max_delay(Duration::MAX);

        assert_eq!(policy.delay_for(200), Duration::MAX);
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::default()
            .reconnect(ReconnectPolicy::default().max_attempts(3).backoff_multiplier(3))
            .heartbeat(HeartbeatConfig::default().timeout(Duration::from_secs(2)));

        assert_eq!(config.reconnect.max_attempts, 3);
        assert_eq!(config.reconnect.delay_for(2), Duration::from_millis(9000));
        assert_eq!(config.heartbeat.timeout, Duration::from_secs(2));
        assert_eq!(config.heartbeat.interval, PING_INTERVAL);
    }
}
