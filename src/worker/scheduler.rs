use log;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::interface::LoadReason;

pub const DEFAULT_INTERVAL : Duration = Duration::from_millis(180_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
  WaitingForBoundary,
  Polling,
}

/// Fires retrievals on wall-clock multiples of `interval`, no matter when
/// the application was started or how long each retrieval takes.
pub struct PollScheduler {
  interval : Duration,
  state : SchedulerState,
}

impl PollScheduler {
  pub fn new(interval : Duration) -> Self {
    let interval = if interval.is_zero() { DEFAULT_INTERVAL } else { interval };
    PollScheduler { interval, state : SchedulerState::WaitingForBoundary }
  }

  /// Time left until the next multiple of the interval.
  pub fn initial_delay(&self, now_ms : u64) -> Duration {
    let interval_ms = self.interval.as_millis() as u64;
    Duration::from_millis(interval_ms - now_ms % interval_ms)
  }

  /// Never returns. `trigger` must not block: it should hand the retrieval
  /// off (e.g. spawn it) so the next tick is not delayed.
  pub async fn run<F>(&mut self, now_ms : u64, mut trigger : F)
    where F : FnMut(LoadReason)
  {
    let delay = self.initial_delay(now_ms);
    log::info!("Polling every {:?}, first aligned tick in {:?}", self.interval, delay);
    time::sleep(delay).await;

    self.state = SchedulerState::Polling;
    log::debug!("Scheduler is {:?}", self.state);
    trigger(LoadReason::AlignedTick);

    let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
      ticker.tick().await;
      trigger(LoadReason::Interval);
    }
  }
}

pub fn unix_now_ms() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_millis() as u64)
    .unwrap_or(0)
}
