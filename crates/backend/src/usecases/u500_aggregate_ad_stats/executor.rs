use anyhow::Result;
use chrono::{Duration, Local, NaiveDate};
use contracts::usecases::u500_aggregate_ad_stats::{
    AggregationReport, AggregationRequest, DEFAULT_ROLLBACK_DAYS,
};
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, FromQueryResult, Statement,
    TransactionTrait,
};

/// First and last day recomputed for a run ending at `target_date`
pub fn aggregation_window(target_date: NaiveDate, rollback_days: u32) -> Result<(NaiveDate, NaiveDate)> {
    if rollback_days == 0 {
        anyhow::bail!("rollback_days must be at least 1");
    }
    let start = target_date
        .checked_sub_signed(Duration::days(i64::from(rollback_days) - 1))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "rollback_days {} reaches before the earliest supported date",
                rollback_days
            )
        })?;
    Ok((start, target_date))
}

/// Yesterday in server local time, the default last day of a run
pub fn default_target_date() -> NaiveDate {
    Local::now().date_naive() - Duration::days(1)
}

/// Fills in defaults of an on-demand request
pub fn resolve_request(request: &AggregationRequest) -> (NaiveDate, u32) {
    (
        request.target_date.unwrap_or_else(default_target_date),
        request.rollback_days.unwrap_or(DEFAULT_ROLLBACK_DAYS),
    )
}

const DELETE_WINDOW_SQL: &str = "DELETE FROM ad_stats_daily WHERE date_day >= ? AND date_day <= ?";

/// Requests are attributed to the day of their track_time
const AGGREGATE_WINDOW_SQL: &str = r#"
    INSERT INTO ad_stats_daily
        (date_day, up_id, ds_id, ad_id, channel_id, os, is_callback_sent, callback_event_type,
         request_count, callback_count, request_success_count, request_failed_count,
         callback_failed_count, updated_at)
    SELECT
        DATE(track_time) AS date_day,
        up_id,
        ds_id,
        ad_id,
        channel_id,
        os,
        is_callback_sent,
        callback_event_type,
        COUNT(*) AS request_count,
        SUM(CASE WHEN is_callback_sent = 1 THEN 1 ELSE 0 END) AS callback_count,
        SUM(CASE WHEN request_status = 'success' THEN 1 ELSE 0 END) AS request_success_count,
        SUM(CASE WHEN request_status = 'failed' THEN 1 ELSE 0 END) AS request_failed_count,
        SUM(CASE WHEN callback_status = 'failed' THEN 1 ELSE 0 END) AS callback_failed_count,
        strftime('%Y-%m-%d %H:%M:%S', 'now', 'localtime') AS updated_at
    FROM request_log
    WHERE DATE(track_time) >= ? AND DATE(track_time) <= ?
    GROUP BY
        DATE(track_time),
        up_id,
        ds_id,
        ad_id,
        channel_id,
        os,
        is_callback_sent,
        callback_event_type
    ORDER BY date_day, ds_id, ad_id, is_callback_sent
"#;

const VALIDATE_WINDOW_SQL: &str = r#"
    SELECT
        COUNT(*) AS total_rows,
        COALESCE(SUM(request_count), 0) AS total_requests,
        COALESCE(SUM(callback_count), 0) AS total_callbacks,
        MIN(date_day) AS min_date,
        MAX(date_day) AS max_date
    FROM ad_stats_daily
    WHERE date_day >= ? AND date_day <= ?
"#;

#[derive(Debug, FromQueryResult)]
struct WindowValidation {
    total_rows: i64,
    total_requests: i64,
    total_callbacks: i64,
    min_date: Option<String>,
    max_date: Option<String>,
}

/// Rebuilds `ad_stats_daily` for the rollback window ending at `target_date`.
///
/// The window is deleted and re-aggregated from `request_log` in one
/// transaction, so callbacks that arrived late replace the earlier counts.
pub async fn aggregate_daily(
    db: &DatabaseConnection,
    target_date: NaiveDate,
    rollback_days: u32,
) -> Result<AggregationReport> {
    let (window_start, window_end) = aggregation_window(target_date, rollback_days)?;
    let start = window_start.format("%Y-%m-%d").to_string();
    let end = window_end.format("%Y-%m-%d").to_string();
    tracing::info!(
        "U500: aggregating {} .. {} ({} day rollback)",
        start,
        end,
        rollback_days
    );

    let txn = db.begin().await?;

    let deleted = txn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            DELETE_WINDOW_SQL,
            [start.clone().into(), end.clone().into()],
        ))
        .await?
        .rows_affected();
    tracing::info!("U500: removed {} stale rows", deleted);

    let inserted = txn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            AGGREGATE_WINDOW_SQL,
            [start.clone().into(), end.clone().into()],
        ))
        .await?
        .rows_affected();

    txn.commit().await?;

    if inserted == 0 {
        tracing::warn!("U500: no source requests found in {} .. {}", start, end);
    } else {
        tracing::info!("U500: inserted {} aggregated rows", inserted);
    }

    let validation = WindowValidation::find_by_statement(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        VALIDATE_WINDOW_SQL,
        [start.into(), end.into()],
    ))
    .one(db)
    .await?
    .ok_or_else(|| anyhow::anyhow!("validation query returned no row"))?;

    tracing::info!(
        "U500: window check: rows={}, requests={}, callbacks={}, dates={:?}..{:?}",
        validation.total_rows,
        validation.total_requests,
        validation.total_callbacks,
        validation.min_date,
        validation.max_date
    );

    Ok(AggregationReport {
        window_start,
        window_end,
        deleted_rows: deleted,
        inserted_rows: inserted,
        total_requests: validation.total_requests,
        total_callbacks: validation.total_callbacks,
        min_date: validation.min_date,
        max_date: validation.max_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::test_connection;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_aggregation_window() {
        assert_eq!(
            aggregation_window(date("2025-03-10"), 7).unwrap(),
            (date("2025-03-04"), date("2025-03-10"))
        );
        assert_eq!(
            aggregation_window(date("2025-03-01"), 3).unwrap(),
            (date("2025-02-27"), date("2025-03-01"))
        );
        assert_eq!(
            aggregation_window(date("2025-03-10"), 1).unwrap(),
            (date("2025-03-10"), date("2025-03-10"))
        );
        assert!(aggregation_window(date("2025-03-10"), 0).is_err());
        assert!(aggregation_window(date("2025-03-10"), 100_000_000).is_err());
        assert!(aggregation_window(date("2025-03-10"), u32::MAX).is_err());
    }

    #[test]
    fn test_resolve_request_defaults() {
        let (target, days) = resolve_request(&AggregationRequest::default());
        assert_eq!(target, default_target_date());
        assert_eq!(days, DEFAULT_ROLLBACK_DAYS);

        let explicit = AggregationRequest {
            target_date: Some(date("2025-01-31")),
            rollback_days: Some(3),
        };
        assert_eq!(resolve_request(&explicit), (date("2025-01-31"), 3));
    }

    #[tokio::test]
    async fn test_window_is_rebuilt_from_request_log() {
        let db = test_connection().await;
        db.execute_unprepared(
            r#"
            INSERT INTO request_log
                (track_time, up_id, ds_id, ad_id, channel_id, os, is_callback_sent,
                 callback_event_type, request_status, callback_status)
            VALUES
                ('2025-03-09 08:00:00', 'up1', 'ds1', 'A1', 'ch1', 'ios', 1, 'ACTIVATED', 'success', 'ok'),
                ('2025-03-09 09:00:00', 'up1', 'ds1', 'A1', 'ch1', 'ios', 1, 'ACTIVATED', 'success', 'failed'),
                ('2025-03-09 10:00:00', 'up1', 'ds1', 'A1', 'ch1', 'ios', 0, NULL, 'failed', NULL),
                ('2025-03-10 11:00:00', 'up1', 'ds1', 'A1', 'ch1', 'ios', 2, 'PAID', 'success', NULL),
                ('2025-03-01 11:00:00', 'up1', 'ds1', 'A1', 'ch1', 'ios', 1, 'PAID', 'success', NULL);
            "#,
        )
        .await
        .unwrap();
        // stale row inside the window and one outside of it
        db.execute_unprepared(
            "INSERT INTO ad_stats_daily (date_day, ad_id, request_count, callback_count) VALUES \
             ('2025-03-09', 'A1', 999, 999), ('2025-02-01', 'A9', 5, 1);",
        )
        .await
        .unwrap();

        let report = aggregate_daily(&db, date("2025-03-10"), 2).await.unwrap();

        assert_eq!(report.window_start, date("2025-03-09"));
        assert_eq!(report.deleted_rows, 1);
        // (03-09, sent, ACTIVATED), (03-09, not sent), (03-10, deducted, PAID)
        assert_eq!(report.inserted_rows, 3);
        assert_eq!(report.total_requests, 4);
        assert_eq!(report.total_callbacks, 2);
        assert_eq!(report.min_date.as_deref(), Some("2025-03-09"));
        assert_eq!(report.max_date.as_deref(), Some("2025-03-10"));

        #[derive(Debug, FromQueryResult)]
        struct Counts {
            request_count: i64,
            request_success_count: i64,
            request_failed_count: i64,
            callback_failed_count: i64,
        }
        let activated = Counts::find_by_statement(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT request_count, request_success_count, request_failed_count, callback_failed_count \
             FROM ad_stats_daily WHERE date_day = '2025-03-09' AND callback_event_type = 'ACTIVATED'"
                .to_string(),
        ))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
        assert_eq!(activated.request_count, 2);
        assert_eq!(activated.request_success_count, 2);
        assert_eq!(activated.request_failed_count, 0);
        assert_eq!(activated.callback_failed_count, 1);

        // rows outside of the window are untouched
        let outside = Counts::find_by_statement(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT request_count, request_success_count, request_failed_count, callback_failed_count \
             FROM ad_stats_daily WHERE date_day = '2025-02-01'"
                .to_string(),
        ))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
        assert_eq!(outside.request_count, 5);

        // a second run over the same window is stable
        let again = aggregate_daily(&db, date("2025-03-10"), 2).await.unwrap();
        assert_eq!(again.deleted_rows, 3);
        assert_eq!(again.inserted_rows, 3);
        assert_eq!(again.total_requests, 4);
    }
}
