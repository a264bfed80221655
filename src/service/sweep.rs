use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::service::ServiceContext;

/// The only long-running background task in the system: periodically
/// expires stale holds and completes past-checkout stays. Everything else
/// is a short-lived unit of work per request.
pub fn spawn_sweeper(ctx: Arc<ServiceContext>, interval_secs: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match ctx.reservation_service.expire_stale_holds().await {
                Ok(expired) if !expired.is_empty() => {
                    tracing::info!("sweeper expired {} stale hold(s)", expired.len());
                }
                Ok(_) => {}
                Err(e) => tracing::error!("sweeper failed to expire holds: {}", e),
            }

            match ctx
                .reservation_service
                .complete_past_checkouts(Utc::now().date_naive())
                .await
            {
                Ok(completed) if !completed.is_empty() => {
                    tracing::info!("sweeper completed {} booking(s)", completed.len());
                }
                Ok(_) => {}
                Err(e) => tracing::error!("sweeper failed to complete bookings: {}", e),
            }
        }
    })
}
