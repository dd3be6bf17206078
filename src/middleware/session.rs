use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::account::{resolve_account_id, AccountScope};
use crate::auth::Session;
use crate::error::ApiError;
use crate::state::AppState;

/// Resolved caller: who they are and which account their queries are pinned to.
#[derive(Clone)]
pub struct AccountContext {
    pub session: Session,
    pub scope: AccountScope,
}

/// Verifies the session cookie (or bearer token) and injects the [`Session`].
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let session = state.sessions.authenticate(request.headers())?;

    tracing::debug!(user_id = %session.user_id, role = %session.role, "Session verified");
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// Builds the per-request client, resolves the account and injects an
/// [`AccountContext`]. Must run after [`authenticate`].
pub async fn resolve_account(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let session = request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let client = state.db.for_session(&session);
    let account_id = resolve_account_id(&client).await?;

    request.extensions_mut().insert(AccountContext {
        session,
        scope: AccountScope::new(account_id, client),
    });

    Ok(next.run(request).await)
}
