use axum::extract::Extension;
use serde_json::json;

use crate::database::models::UserSettings;
use crate::filter::FilterData;
use crate::middleware::{AccountContext, ApiResponse, ApiResult};

/// GET /api/settings/user
///
/// Users who never saved settings get the defaults.
pub async fn user(Extension(ctx): Extension<AccountContext>) -> ApiResult<UserSettings> {
    let user_id = ctx.session.user_id;
    let data = FilterData {
        where_clause: Some(json!({ "user_id": user_id })),
        ..Default::default()
    };

    let settings = ctx
        .scope
        .select_one::<UserSettings>(data)
        .await?
        .unwrap_or_else(|| UserSettings::defaults(ctx.scope.account_id(), user_id));

    Ok(ApiResponse::success(settings))
}
