//! Farming loop — the ticker that fires the command when due.
//! Uses tokio::interval for zero-overhead ticking; precision of minutes is
//! all the schedule needs, so the tick is deliberately coarse.

use std::sync::Arc;

use chrono::Utc;
use irisfarm_core::error::Result;
use irisfarm_core::transport::CommandTransport;
use tokio::sync::Mutex;

use crate::schedule::FarmSchedule;
use crate::sender;

/// Cooldown before a fatal tick error escalates to a restart.
const FATAL_COOLDOWN_SECS: u64 = 60;
/// While idle, emit a progress line roughly this often.
const PROGRESS_EVERY_SECS: i64 = 600;

/// Run the farm loop until `running` is cleared or a tick fails fatally.
///
/// An `Err` return means the caller should restart the whole process; every
/// recoverable condition has already been absorbed by rescheduling.
pub async fn run<T>(
    transport: Arc<T>,
    group_id: i64,
    command: String,
    schedule: Arc<Mutex<FarmSchedule>>,
    tick_secs: u64,
) -> Result<()>
where
    T: CommandTransport + ?Sized,
{
    tracing::info!("⏰ Farm loop started (check every {tick_secs}s)");

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(tick_secs));

    loop {
        interval.tick().await;

        if !schedule.lock().await.running {
            tracing::info!("Farm loop stopped");
            return Ok(());
        }

        if let Err(e) = tick(transport.as_ref(), group_id, &command, &schedule, tick_secs).await {
            tracing::error!("Farm loop tick failed: {e}");
            tokio::time::sleep(std::time::Duration::from_secs(FATAL_COOLDOWN_SECS)).await;
            return Err(e);
        }
    }
}

/// One schedule check. Holds the schedule lock across the send so a reply
/// arriving mid-send is applied strictly after the attempt.
async fn tick<T>(
    transport: &T,
    group_id: i64,
    command: &str,
    schedule: &Arc<Mutex<FarmSchedule>>,
    tick_secs: u64,
) -> Result<()>
where
    T: CommandTransport + ?Sized,
{
    let now = Utc::now();
    let mut sched = schedule.lock().await;

    if sched.is_due(now) {
        tracing::info!("Time to farm!");
        sender::send_farm_command(transport, group_id, command, &mut sched).await?;
    } else {
        let left = sched.remaining(now).num_seconds();
        if left % PROGRESS_EVERY_SECS < tick_secs as i64 {
            let (hours, rem) = (left / 3600, left % 3600);
            let (minutes, seconds) = (rem / 60, rem % 60);
            tracing::info!("Waiting for next farm: {hours}h {minutes}m {seconds}s");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CommandTransport for CountingTransport {
        async fn send_command(&self, _chat_id: i64, _text: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_tick_before_due_sends_nothing() {
        let now = Utc::now();
        let mut initial = FarmSchedule::new(now);
        initial.next_farm_time = now + chrono::Duration::hours(1);
        let schedule = Arc::new(Mutex::new(initial.clone()));
        let transport = CountingTransport::default();

        tick(&transport, -100, "Фарма", &schedule, 10).await.unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            schedule.lock().await.next_farm_time,
            initial.next_farm_time
        );
    }

    #[tokio::test]
    async fn test_tick_when_due_sends_once() {
        let now = Utc::now();
        let schedule = Arc::new(Mutex::new(FarmSchedule::new(now)));
        let transport = CountingTransport::default();

        tick(&transport, -100, "Фарма", &schedule, 10).await.unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loop_exits_when_running_cleared() {
        let now = Utc::now();
        let mut initial = FarmSchedule::new(now);
        initial.running = false;
        let schedule = Arc::new(Mutex::new(initial));
        let transport = Arc::new(CountingTransport::default());

        run(transport.clone(), -100, "Фарма".into(), schedule, 1)
            .await
            .unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
