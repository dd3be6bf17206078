use axum::extract::{Extension, State};
use serde::Deserialize;

use crate::database::models::Guide;
use crate::middleware::{AccountContext, ApiResponse, ApiResult};
use crate::state::AppState;

use super::{ApiQuery, PageQuery};

const GUIDE_SORTABLE: &[&str] = &[
    "title", "slug", "category", "status", "updated_at", "published_at",
];

#[derive(Debug, Default, Deserialize)]
pub struct GuideFilters {
    pub status: Option<String>,
    pub category: Option<String>,
}

/// GET /api/guides/list
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<AccountContext>,
    ApiQuery(filters): ApiQuery<GuideFilters>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Vec<Guide>> {
    let data = page.to_filter_data(
        &state.config.api,
        &[("status", filters.status.as_deref()), ("category", filters.category.as_deref())],
        "updated_at desc",
        GUIDE_SORTABLE,
    )?;

    let guides = ctx.scope.select::<Guide>(data).await?;
    Ok(ApiResponse::success(guides))
}
