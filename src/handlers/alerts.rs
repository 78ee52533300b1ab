use crate::{
    errors::ServiceError,
    services::alerts::{AlertPage, LowStockAlert, DEFAULT_LIMIT, DEFAULT_OFFSET},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Pagination over candidate rows, applied before threshold filtering.
///
/// Kept as raw strings so that garbage falls back to the defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockQuery {
    /// Maximum candidate rows to inspect (default 100)
    pub limit: Option<String>,
    /// Candidate rows to skip (default 0)
    pub offset: Option<String>,
}

impl LowStockQuery {
    pub fn page(&self) -> AlertPage {
        let limit = self
            .limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|limit| *limit > 0)
            .map_or(DEFAULT_LIMIT, |limit| limit as u64);
        let offset = self
            .offset
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|offset| *offset >= 0)
            .map_or(DEFAULT_OFFSET, |offset| offset as u64);
        AlertPage { limit, offset }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LowStockAlertsResponse {
    pub alerts: Vec<LowStockAlert>,
    pub total_alerts: usize,
}

/// List low-stock alerts for a company
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/alerts/low-stock",
    params(
        ("company_id" = i32, Path, description = "Company ID"),
        LowStockQuery
    ),
    responses(
        (status = 200, description = "Alerts returned", body = LowStockAlertsResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid company ID", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn low_stock_alerts(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Query(query): Query<LowStockQuery>,
) -> Result<Json<LowStockAlertsResponse>, ServiceError> {
    let company_id: i32 = company_id
        .trim()
        .parse()
        .map_err(|_| ServiceError::validation("Invalid company ID"))?;

    let alerts = state
        .services
        .alerts
        .low_stock_alerts(company_id, query.page())
        .await?;

    Ok(Json(LowStockAlertsResponse {
        total_alerts: alerts.len(),
        alerts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, 100, 0)]
    #[case(Some("5"), Some("10"), 5, 10)]
    #[case(Some("0"), Some("-1"), 100, 0)]
    #[case(Some("abc"), Some("x"), 100, 0)]
    #[case(Some(" 7 "), None, 7, 0)]
    fn page_defaults(
        #[case] limit: Option<&str>,
        #[case] offset: Option<&str>,
        #[case] expected_limit: u64,
        #[case] expected_offset: u64,
    ) {
        let query = LowStockQuery {
            limit: limit.map(str::to_string),
            offset: offset.map(str::to_string),
        };
        assert_eq!(
            query.page(),
            AlertPage {
                limit: expected_limit,
                offset: expected_offset
            }
        );
    }
}
