use axum::extract::{Extension, State};

use crate::database::models::Customer;
use crate::filter::FilterData;
use crate::middleware::{AccountContext, ApiResponse, ApiResult};
use crate::services::retention_service::{self, RetentionAnalysis};
use crate::state::AppState;

/// GET /api/retention/analysis
pub async fn analysis(
    State(state): State<AppState>,
    Extension(ctx): Extension<AccountContext>,
) -> ApiResult<RetentionAnalysis> {
    let customers = ctx.scope.select::<Customer>(FilterData::default()).await?;
    let analysis = retention_service::analyze(ctx.scope.account_id(), &customers, &state.config.retention);
    Ok(ApiResponse::success(analysis))
}
