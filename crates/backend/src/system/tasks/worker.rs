use anyhow::Result;
use chrono::{DateTime, Local};
use cron::Schedule;
use sea_orm::DatabaseConnection;
use std::str::FromStr;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};
use uuid::Uuid;

use crate::shared::config::AggregationConfig;
use crate::usecases::u500_aggregate_ad_stats::executor;

/// Background worker that rebuilds `ad_stats_daily` on a cron schedule
pub struct AggregationWorker {
    schedule: Schedule,
    rollback_days: u32,
    interval_seconds: u64,
}

impl AggregationWorker {
    pub fn new(config: &AggregationConfig) -> Result<Self> {
        let schedule = Schedule::from_str(&config.schedule).map_err(|e| {
            anyhow::anyhow!("Invalid aggregation schedule '{}': {}", config.schedule, e)
        })?;
        executor::aggregation_window(executor::default_target_date(), config.rollback_days)
            .map_err(|e| anyhow::anyhow!("Invalid aggregation rollback: {}", e))?;
        Ok(Self {
            schedule,
            rollback_days: config.rollback_days,
            interval_seconds: config.check_interval_seconds.max(1),
        })
    }

    /// Checks the schedule every `interval_seconds` and runs the aggregation when a fire time has passed
    pub async fn run_loop(self, db: &'static DatabaseConnection) {
        info!(
            "Aggregation worker started (check every {} seconds, {} day rollback)",
            self.interval_seconds, self.rollback_days
        );
        let mut interval = time::interval(time::Duration::from_secs(self.interval_seconds));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut last_check = Local::now();
        loop {
            interval.tick().await;
            let now = Local::now();
            if is_due(&self.schedule, &last_check, &now) {
                self.run_once(db).await;
            }
            last_check = now;
        }
    }

    async fn run_once(&self, db: &DatabaseConnection) {
        let session_id = Uuid::new_v4().to_string();
        let target_date = executor::default_target_date();
        info!(
            "Aggregation session {} started for {}",
            session_id, target_date
        );

        match executor::aggregate_daily(db, target_date, self.rollback_days).await {
            Ok(report) => info!(
                "Aggregation session {} completed: {} rows for {} .. {}",
                session_id, report.inserted_rows, report.window_start, report.window_end
            ),
            Err(e) => error!("Aggregation session {} failed: {:?}", session_id, e),
        }
    }
}

/// True when the schedule has a fire time in `(last_check, now]`
pub fn is_due(schedule: &Schedule, last_check: &DateTime<Local>, now: &DateTime<Local>) -> bool {
    schedule
        .after(last_check)
        .next()
        .map(|next| next <= *now)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 10, h, m, s).unwrap()
    }

    #[test]
    fn test_is_due() {
        let schedule = Schedule::from_str("0 30 1 * * *").unwrap();

        assert!(is_due(&schedule, &at(1, 29, 30), &at(1, 30, 30)));
        assert!(is_due(&schedule, &at(1, 29, 59), &at(1, 30, 0)));
        assert!(!is_due(&schedule, &at(1, 30, 0), &at(1, 31, 0)));
        assert!(!is_due(&schedule, &at(2, 0, 0), &at(2, 1, 0)));
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let config = AggregationConfig {
            schedule: "every night".to_string(),
            ..Default::default()
        };
        assert!(AggregationWorker::new(&config).is_err());
    }

    #[test]
    fn test_invalid_rollback_rejected() {
        let zero = AggregationConfig {
            rollback_days: 0,
            ..Default::default()
        };
        assert!(AggregationWorker::new(&zero).is_err());

        let huge = AggregationConfig {
            rollback_days: 100_000_000,
            ..Default::default()
        };
        assert!(AggregationWorker::new(&huge).is_err());
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = AggregationConfig {
            check_interval_seconds: 0,
            ..Default::default()
        };
        let worker = AggregationWorker::new(&config).unwrap();
        assert_eq!(worker.interval_seconds, 1);
        assert_eq!(worker.rollback_days, 7);
    }
}
