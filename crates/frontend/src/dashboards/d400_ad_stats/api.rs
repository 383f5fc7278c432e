use contracts::dashboards::d400_ad_stats::{
    ApiPayload, DataQuery, DataResponse, ErrorResponse, FilterOptions,
};
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;

use super::state::query_string;

/// Load date bounds, ad names and the id lists of every select
pub async fn get_filter_options() -> Result<FilterOptions, String> {
    let response = Request::get("/api/filter-options")
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    read_payload(response, "Filter options API error").await
}

/// Load the metrics rows of one query
pub async fn get_data(query: &DataQuery) -> Result<DataResponse, String> {
    let url = format!("/api/data?{}", query_string(query));

    let response = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    read_payload(response, "Data API error").await
}

/// Message of a non-2xx response: the body's `error`, or "<fallback> (<status>)"
/// when the body has none
pub fn error_message(fallback: &str, status: u16, body: Option<ErrorResponse>) -> String {
    match body {
        Some(body) if !body.error.is_empty() => body.error,
        _ => format!("{} ({})", fallback, status),
    }
}

/// 2xx bodies may still carry an `error`
async fn read_payload<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, String> {
    if !response.ok() {
        let status = response.status();
        let body = response.json::<ErrorResponse>().await.ok();
        return Err(error_message(fallback, status, body));
    }

    let payload: ApiPayload<T> = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))?;

    payload.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_body() {
        let body = ErrorResponse {
            error: "invalid value for start_date: \"yesterday\"".to_string(),
        };
        assert_eq!(
            error_message("Data API error", 400, Some(body)),
            "invalid value for start_date: \"yesterday\""
        );
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        assert_eq!(
            error_message("Data API error", 500, None),
            "Data API error (500)"
        );
        let empty = ErrorResponse {
            error: String::new(),
        };
        assert_eq!(
            error_message("Filter options API error", 502, Some(empty)),
            "Filter options API error (502)"
        );
    }
}
