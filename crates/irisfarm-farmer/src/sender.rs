//! Command sender — one delivery attempt per due tick.

use chrono::Utc;
use irisfarm_core::error::{FarmError, Result};
use irisfarm_core::transport::CommandTransport;

use crate::schedule::FarmSchedule;

/// Send the farm command once.
///
/// Delivery problems never bubble up as failures: flood control reschedules
/// with the signaled wait plus a buffer, any other transport error falls back
/// to the short retry interval. A successful send leaves the schedule alone —
/// the reply from Iris is what reschedules.
pub async fn send_farm_command<T>(
    transport: &T,
    group_id: i64,
    command: &str,
    schedule: &mut FarmSchedule,
) -> Result<()>
where
    T: CommandTransport + ?Sized,
{
    tracing::info!("Sending '{command}' to group {group_id}");
    match transport.send_command(group_id, command).await {
        Ok(()) => {
            tracing::info!("Command delivered");
            Ok(())
        }
        Err(FarmError::RateLimited { retry_after }) => {
            let next = schedule.after_rate_limit(Utc::now(), retry_after);
            tracing::warn!("⚠️ Rate limited! Waiting {retry_after}s, next attempt at {next}");
            Ok(())
        }
        Err(e @ (FarmError::Transport(_) | FarmError::ChatAccess(_))) => {
            let next = schedule.after_send_failure(Utc::now());
            tracing::error!("❌ Failed to send command: {e}. Retrying at {next}");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
