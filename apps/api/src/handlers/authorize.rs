use axum::Json;
use axum::extract::State;
use sitebeam_core::{AppError, UserId};
use sitebeam_domain::{AccessError, PermissionId, Scope};
use tracing::error;

use crate::dto::{AuthorizeRequest, AuthorizeResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// The guard-facing contract: decides a `(user, permission, business-unit)`
/// check on behalf of the calling service, which logs the outcome itself.
pub async fn authorize_handler(
    State(state): State<AppState>,
    Json(payload): Json<AuthorizeRequest>,
) -> ApiResult<Json<AuthorizeResponse>> {
    let user_id = UserId::from_uuid(payload.user_id);
    let permission = PermissionId::parse(payload.permission.as_str())?;
    let target = Scope::parse(payload.business_unit.as_str())?;

    match state
        .authorization_service
        .authorize(user_id, &permission, &target)
        .await
    {
        Ok(decision) => Ok(Json(AuthorizeResponse::from(decision))),
        Err(AccessError::DataAccessFailure(detail)) => {
            // Availability failures never fail open.
            error!(%detail, "assignment store unavailable, failing closed");
            Ok(Json(AuthorizeResponse::denied(
                "authorization data unavailable",
            )))
        }
        Err(AccessError::UnknownPermission(permission)) => Err(AppError::Internal(format!(
            "caller requested unregistered permission '{permission}'"
        ))
        .into()),
        Err(error) => Err(AppError::from(error).into()),
    }
}
