use super::*;

pub async fn list_assignments_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<AssignmentsQuery>,
) -> ApiResult<Json<Vec<AssignmentResponse>>> {
    let assignments = state
        .security_admin_service
        .list_assignments_for_user(&user, UserId::from_uuid(query.user_id))
        .await?
        .into_iter()
        .map(AssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn grant_assignment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<GrantAssignmentRequest>,
) -> ApiResult<(StatusCode, Json<AssignmentResponse>)> {
    let role_id = RoleId::parse(payload.role_id.as_str())?;
    let scope = Scope::parse(payload.business_unit.as_str())?;

    let assignment = state
        .security_admin_service
        .grant_assignment(
            &user,
            GrantAssignmentInput {
                user_id: UserId::from_uuid(payload.user_id),
                role_id,
                scope,
                expires_at: payload.expires_at,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from(assignment))))
}

pub async fn revoke_assignment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RevokeAssignmentRequest>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::parse(payload.role_id.as_str())?;
    let scope = Scope::parse(payload.business_unit.as_str())?;

    state
        .security_admin_service
        .revoke_assignment(&user, UserId::from_uuid(payload.user_id), &role_id, &scope)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
