use axum::extract::{Extension, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use sitebeam_application::{AccessDecision, AccessRequirement, TargetSource};
use sitebeam_core::{AppError, UserId, UserIdentity};
use sitebeam_domain::{AccessError, BusinessUnitId, Scope};
use tracing::error;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

/// Gateway header carrying the authenticated principal id.
pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";

/// Gateway header carrying the principal display name.
pub const PRINCIPAL_NAME_HEADER: &str = "x-principal-name";

/// Header naming the business unit a request targets.
pub const BUSINESS_UNIT_HEADER: &str = "x-business-unit";

/// Turns the trusted gateway headers into a `UserIdentity` request extension.
pub async fn require_identity(mut request: Request, next: Next) -> ApiResult<Response> {
    let headers = request.headers();
    let principal = headers
        .get(PRINCIPAL_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing x-principal-id header".to_owned()))?;
    let user_id = Uuid::parse_str(principal)
        .map(UserId::from_uuid)
        .map_err(|error| AppError::Unauthorized(format!("invalid x-principal-id header: {error}")))?;
    let display_name = headers
        .get(PRINCIPAL_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_owned();

    request
        .extensions_mut()
        .insert(UserIdentity::new(user_id, display_name));

    Ok(next.run(request).await)
}

/// Enforces the route's declared access requirement through the resolution
/// engine. A failing assignment store denies the request and logs the error;
/// it never fails open.
pub async fn enforce_access(
    State(state): State<AppState>,
    Extension(requirement): Extension<AccessRequirement>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = request
        .extensions()
        .get::<UserIdentity>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    let target = target_scope(request.headers(), requirement.target_source)?;

    match state
        .authorization_service
        .authorize(identity.user_id(), &requirement.permission, &target)
        .await
    {
        Ok(AccessDecision::Allow { .. }) => Ok(next.run(request).await),
        Ok(AccessDecision::Deny { reason }) => {
            Err(AppError::Forbidden(format!("access denied: {reason}")).into())
        }
        Err(AccessError::DataAccessFailure(detail)) => {
            error!(%detail, "assignment store unavailable, denying request");
            Err(AppError::Forbidden("access denied".to_owned()).into())
        }
        Err(AccessError::UnknownPermission(permission)) => Err(AppError::Internal(format!(
            "route requires unregistered permission '{permission}'"
        ))
        .into()),
        Err(error) => Err(AppError::from(error).into()),
    }
}

fn target_scope(headers: &HeaderMap, target_source: TargetSource) -> Result<Scope, AppError> {
    match target_source {
        TargetSource::Global => Ok(Scope::Global),
        TargetSource::RequestUnit => {
            let value = headers
                .get(BUSINESS_UNIT_HEADER)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| {
                    AppError::Validation("x-business-unit header is required".to_owned())
                })?;

            Ok(Scope::Unit(BusinessUnitId::new(value)?))
        }
    }
}
