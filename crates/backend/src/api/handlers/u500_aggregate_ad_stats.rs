use axum::{extract::rejection::JsonRejection, Json};
use contracts::usecases::u500_aggregate_ad_stats::{AggregationReport, AggregationRequest};

use crate::api::error::ApiError;
use crate::shared::data::db::get_connection;
use crate::usecases::u500_aggregate_ad_stats::executor;

/// POST /api/u500/aggregate
///
/// Body: `{"target_date": "2025-03-10", "rollback_days": 7}`, both optional
pub async fn aggregate(
    payload: Result<Json<AggregationRequest>, JsonRejection>,
) -> Result<Json<AggregationReport>, ApiError> {
    let Json(request) = payload?;
    let (target_date, rollback_days) = executor::resolve_request(&request);
    executor::aggregation_window(target_date, rollback_days)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        "U500: on-demand aggregation for {} ({} days)",
        target_date,
        rollback_days
    );
    let db = get_connection()?;
    match executor::aggregate_daily(db, target_date, rollback_days).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            tracing::error!("U500: aggregation failed: {:?}", e);
            Err(ApiError::Internal(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::NaiveDate;

    async fn rejected(rollback_days: u32) -> ApiError {
        let request = AggregationRequest {
            target_date: NaiveDate::from_ymd_opt(2025, 3, 10),
            rollback_days: Some(rollback_days),
        };
        match aggregate(Ok(Json(request))).await {
            Ok(_) => panic!("rollback_days {} was accepted", rollback_days),
            Err(e) => e,
        }
    }

    #[tokio::test]
    async fn test_invalid_rollback_is_bad_request() {
        // both fail before a database connection is needed
        for days in [0, 100_000_000] {
            let err = rejected(days).await;
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }
}
