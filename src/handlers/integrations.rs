use axum::extract::Extension;
use serde::Serialize;
use serde_json::json;

use crate::database::models::{Integration, IntegrationStatus};
use crate::filter::FilterData;
use crate::middleware::{AccountContext, ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct IntegrationStatusView {
    pub integrations: Vec<Integration>,
    pub connected: usize,
    pub errored: usize,
    pub total: usize,
}

impl From<Vec<Integration>> for IntegrationStatusView {
    fn from(integrations: Vec<Integration>) -> Self {
        let with_status = |status| integrations.iter().filter(|i| i.status == status).count();
        Self {
            connected: with_status(IntegrationStatus::Connected),
            errored: with_status(IntegrationStatus::Error),
            total: integrations.len(),
            integrations,
        }
    }
}

/// GET /api/integrations/status
pub async fn status(Extension(ctx): Extension<AccountContext>) -> ApiResult<IntegrationStatusView> {
    let data = FilterData {
        order: Some(json!("provider asc")),
        ..Default::default()
    };

    let integrations = ctx.scope.select::<Integration>(data).await?;
    Ok(ApiResponse::success(integrations.into()))
}
