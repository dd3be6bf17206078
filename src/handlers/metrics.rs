use axum::extract::{Extension, State};
use serde::Deserialize;
use serde_json::json;

use crate::database::models::{CohortRecord, KpiRecord, SegmentRecord};
use crate::filter::FilterData;
use crate::middleware::{AccountContext, ApiResponse, ApiResult};
use crate::services::metrics_service::{self, CohortView, KpiSnapshot};
use crate::state::AppState;

use super::ApiQuery;

pub const DEFAULT_COHORT_MONTHS: i32 = 12;

#[derive(Debug, Default, Deserialize)]
pub struct CohortQuery {
    /// Number of most recent cohort months.
    pub limit: Option<i32>,
}

/// GET /api/metrics/cohorts
///
/// Most recent cohorts, returned oldest first.
pub async fn cohorts(
    State(state): State<AppState>,
    Extension(ctx): Extension<AccountContext>,
    ApiQuery(query): ApiQuery<CohortQuery>,
) -> ApiResult<Vec<CohortView>> {
    let months = query
        .limit
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_COHORT_MONTHS)
        .min(state.config.api.max_limit);

    let data = FilterData {
        order: Some(json!("cohort_month desc")),
        limit: Some(months),
        ..Default::default()
    };

    let mut records = ctx.scope.select::<CohortRecord>(data).await?;
    records.reverse();
    Ok(ApiResponse::success(records.into_iter().map(CohortView::from).collect()))
}

/// GET /api/metrics/kpis
pub async fn kpis(Extension(ctx): Extension<AccountContext>) -> ApiResult<Vec<KpiSnapshot>> {
    let data = FilterData {
        order: Some(json!("recorded_at desc")),
        ..Default::default()
    };

    let records = ctx.scope.select::<KpiRecord>(data).await?;
    Ok(ApiResponse::success(metrics_service::latest_kpis(records)))
}

/// GET /api/metrics/segments
pub async fn segments(Extension(ctx): Extension<AccountContext>) -> ApiResult<Vec<SegmentRecord>> {
    let data = FilterData {
        order: Some(json!("mrr desc, name asc")),
        ..Default::default()
    };

    let segments = ctx.scope.select::<SegmentRecord>(data).await?;
    Ok(ApiResponse::success(segments))
}
