use axum::extract::Extension;

use crate::middleware::{AccountContext, ApiResponse, ApiResult};
use crate::services::report_service::{self, ReportSummary};

/// GET /api/reports/summary
pub async fn summary(Extension(ctx): Extension<AccountContext>) -> ApiResult<ReportSummary> {
    let summary = report_service::summarize(&ctx.scope).await?;
    Ok(ApiResponse::success(summary))
}
