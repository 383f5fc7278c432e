use axum::{
    extract::{rejection::QueryRejection, Query},
    Json,
};
use contracts::dashboards::d400_ad_stats::{
    CallbackDistributionRow, DataQuery, DataResponse, FilterOptions, SummaryResponse,
};

use crate::api::error::ApiError;
use crate::dashboards::d400_ad_stats::service;
use crate::shared::data::db::get_connection;

/// GET /api/filter-options
pub async fn get_filter_options() -> Result<Json<FilterOptions>, ApiError> {
    let db = get_connection()?;
    match service::get_filter_options(db).await {
        Ok(options) => {
            tracing::info!(
                "D400 Ad stats: filter options with {} ads, dates {:?}..{:?}",
                options.ad_ids.len(),
                options.date_range.min_date,
                options.date_range.max_date
            );
            Ok(Json(options))
        }
        Err(e) => {
            tracing::error!("D400 Ad stats: Failed to get filter options: {}", e);
            Err(ApiError::from_service(e))
        }
    }
}

/// GET /api/data?start_date=2025-03-01&end_date=2025-03-14&group_by=ad_id&order=desc
pub async fn get_data(
    query: Result<Query<DataQuery>, QueryRejection>,
) -> Result<Json<DataResponse>, ApiError> {
    let Query(query) = query?;
    let db = get_connection()?;
    match service::get_data(db, &query).await {
        Ok(response) => {
            tracing::info!(
                "D400 Ad stats: Returning {} rows (group_by={}, order={})",
                response.count,
                query.group_by().as_param(),
                query.order().as_sql()
            );
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("D400 Ad stats: Failed to get data: {}", e);
            Err(ApiError::from_service(e))
        }
    }
}

/// GET /api/summary
pub async fn get_summary(
    query: Result<Query<DataQuery>, QueryRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let Query(query) = query?;
    let db = get_connection()?;
    service::get_summary(db, &query).await.map(Json).map_err(|e| {
        tracing::error!("D400 Ad stats: Failed to get summary: {}", e);
        ApiError::from_service(e)
    })
}

/// GET /api/callback-distribution
pub async fn get_callback_distribution(
    query: Result<Query<DataQuery>, QueryRejection>,
) -> Result<Json<Vec<CallbackDistributionRow>>, ApiError> {
    let Query(query) = query?;
    let db = get_connection()?;
    service::get_callback_distribution(db, &query)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("D400 Ad stats: Failed to get callback distribution: {}", e);
            ApiError::from_service(e)
        })
}
