use std::time::Duration;

use crate::ws::client::ReconnectPolicy;

/// Reconnect counter, owned by the client worker.
#[derive(Debug)]
pub(crate) struct Backoff {
    policy: ReconnectPolicy,
    attempts: u32,
    current_delay: Duration,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            current_delay: policy.initial_delay.min(policy.max_delay),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }

    /// Record a reconnect attempt, grow delay for the next one
    pub fn advance(&mut self) {
        self.attempts += 1;
        self.current_delay = self.policy.next_delay(self.current_delay);
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.current_delay = self.policy.initial_delay.min(self.policy.max_delay);
    }
}
