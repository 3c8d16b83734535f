use std::time::Duration;

/// Stepped delay schedule for reconnecting to infrastructure. The last step repeats.
pub struct Backoff {
    schedule: Vec<Duration>,
    index: usize,
}

impl Backoff {
    pub fn new(schedule: Vec<Duration>) -> Self {
        Self { schedule, index: 0 }
    }

    /// 0.5s, 1s, 2s, 3s, then 5s between attempts.
    pub fn reconnect() -> Self {
        Self::new(vec![
            Duration::from_millis(500),
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(3),
            Duration::from_secs(5),
        ])
    }

    /// Delay before the next attempt; advances the schedule.
    pub fn on_failure(&mut self) -> Duration {
        let delay = self
            .schedule
            .get(self.index)
            .copied()
            .unwrap_or(Duration::from_secs(1));
        if self.index + 1 < self.schedule.len() {
            self.index += 1;
        }
        delay
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}
