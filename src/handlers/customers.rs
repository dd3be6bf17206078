use axum::extract::{Extension, State};
use serde::Deserialize;

use crate::database::models::Customer;
use crate::middleware::{AccountContext, ApiResponse, ApiResult};
use crate::state::AppState;

use super::{ApiQuery, PageQuery};

const CUSTOMER_SORTABLE: &[&str] = &[
    "name", "email", "company", "status", "plan", "mrr", "health_score", "segment",
    "created_at", "last_active_at", "churned_at",
];

#[derive(Debug, Default, Deserialize)]
pub struct CustomerFilters {
    pub status: Option<String>,
    pub segment: Option<String>,
}

/// GET /api/customers/list
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<AccountContext>,
    ApiQuery(filters): ApiQuery<CustomerFilters>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Vec<Customer>> {
    let data = page.to_filter_data(
        &state.config.api,
        &[("status", filters.status.as_deref()), ("segment", filters.segment.as_deref())],
        "name asc",
        CUSTOMER_SORTABLE,
    )?;

    let customers = ctx.scope.select::<Customer>(data).await?;
    Ok(ApiResponse::success(customers))
}
