use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::{
    entity::{Notifications, notifications},
    error::AppResult,
    state::AppState,
};

/// Deletes notifications whose `expires_at` has passed.
pub async fn purge_expired_notifications(orm: &DatabaseConnection) -> AppResult<u64> {
    let result = Notifications::delete_many()
        .filter(notifications::Column::ExpiresAt.lte(Utc::now()))
        .exec(orm)
        .await?;
    Ok(result.rows_affected)
}

/// Periodic housekeeping: expired notifications and stale rate-limit windows.
pub fn spawn(state: AppState) -> JoinHandle<()> {
    let period = state.config.notification_sweep_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match purge_expired_notifications(&state.orm).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "purged expired notifications"),
                Err(err) => tracing::warn!(error = %err, "notification sweep failed"),
            }
            let pruned = state.limiter.prune();
            if pruned > 0 {
                tracing::debug!(pruned, "pruned rate limit windows");
            }
        }
    })
}
