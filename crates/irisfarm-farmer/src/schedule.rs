//! Schedule state — the single authoritative next-farm time.

use chrono::{DateTime, Duration, Utc};
use irisfarm_core::config::ScheduleConfig;

use crate::classify::Reply;

/// Mutable scheduling state shared between the farm loop and the listener.
///
/// One value per process, wrapped in a mutex by the owner. Every transition
/// overwrites `next_farm_time` outright — last write wins, no merging.
#[derive(Debug, Clone)]
pub struct FarmSchedule {
    /// When the next farm command goes out.
    pub next_farm_time: DateTime<Utc>,
    /// Short wait after soft failures and send errors.
    pub retry_interval: Duration,
    /// Wait after a successful farm.
    pub normal_interval: Duration,
    /// Extra wait on top of a flood-control signal.
    pub flood_buffer: Duration,
    /// Cleared on graceful shutdown to stop the farm loop.
    pub running: bool,
}

impl FarmSchedule {
    /// A schedule that farms immediately, with the stock intervals.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::from_config(&ScheduleConfig::default(), now)
    }

    pub fn from_config(config: &ScheduleConfig, now: DateTime<Utc>) -> Self {
        Self {
            next_farm_time: now,
            retry_interval: Duration::minutes(config.retry_interval_mins),
            normal_interval: Duration::hours(config.normal_interval_hours),
            flood_buffer: Duration::seconds(config.flood_buffer_secs),
            running: true,
        }
    }

    /// Apply a classified reply. Returns the new next-farm time.
    pub fn apply(&mut self, reply: &Reply, now: DateTime<Utc>) -> DateTime<Utc> {
        self.next_farm_time = match reply {
            Reply::Success => now + self.normal_interval,
            Reply::Failure { hours, minutes } => {
                now + Duration::hours(i64::from(*hours)) + Duration::minutes(i64::from(*minutes))
            }
            Reply::Unknown => now + self.retry_interval,
        };
        self.next_farm_time
    }

    /// Reschedule after a flood-control signal of `retry_after` seconds.
    pub fn after_rate_limit(&mut self, now: DateTime<Utc>, retry_after: u64) -> DateTime<Utc> {
        self.next_farm_time = now + Duration::seconds(retry_after as i64) + self.flood_buffer;
        self.next_farm_time
    }

    /// Reschedule after a failed delivery attempt.
    pub fn after_send_failure(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.next_farm_time = now + self.retry_interval;
        self.next_farm_time
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_farm_time
    }

    /// Time left until the next attempt (zero when due).
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.next_farm_time - now).max(Duration::zero())
    }
}
