use super::timer::Timer;
use crate::ws::client::HeartbeatConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeartbeatTick {
    /// time to send next ping
    SendPing,
    /// no pong received before deadline
    PongOverdue,
}

/// Ping interval timer and pong deadline timer, both only armed while connection is open.
#[derive(Debug)]
pub(crate) struct Heartbeat {
    config: HeartbeatConfig,
    ping: Timer,
    pong_deadline: Timer,
}

impl Heartbeat {
    pub fn new(config: HeartbeatConfig) -> Self {
        Self {
            config,
            ping: Timer::default(),
            pong_deadline: Timer::default(),
        }
    }

    pub fn start(&mut self) {
        log::trace!("Heartbeat start, first ping in {:?}", self.config.interval);
        self.pong_deadline.cancel();
        self.ping.arm(self.config.interval);
    }

    pub fn stop(&mut self) {
        if self.ping.cancel() | self.pong_deadline.cancel() {
            log::trace!("Heartbeat stopped");
        }
    }

    /// A ping is going out, schedule next one and wait pong.
    ///
    /// If an earlier ping is still unanswered its deadline is kept.
    pub fn ping_sent(&mut self) {
        self.ping.arm(self.config.interval);
        if !self.pong_deadline.is_armed() {
            self.pong_deadline.arm(self.config.timeout);
        }
        log::trace!("Next pong deadline: {:?}", self.pong_deadline.deadline());
    }

    /// A pong arrived, returns false if no ping was waiting for it
    pub fn pong_received(&mut self) -> bool {
        self.pong_deadline.cancel()
    }

    /// Wait for next heartbeat action, pending forever when stopped
    pub async fn tick(&mut self) -> HeartbeatTick {
        tokio::select! {
            biased;

            _ = self.pong_deadline.fired() => HeartbeatTick::PongOverdue,
            _ = self.ping.fired() => HeartbeatTick::SendPing,
        }
    }
}
