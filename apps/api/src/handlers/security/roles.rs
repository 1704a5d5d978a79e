use super::*;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .security_admin_service
        .list_roles(&user)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role_id = RoleId::parse(payload.role_id.as_str())?;
    let permissions = payload
        .permissions
        .iter()
        .map(|value| PermissionId::parse(value.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let role = state
        .security_admin_service
        .create_role(
            &user,
            CreateRoleInput {
                role_id,
                display_name: payload.display_name,
                localized_name: payload.localized_name,
                privilege_level: payload.privilege_level,
                is_system: payload.is_system,
                permissions,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn grant_role_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<RolePermissionRequest>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::parse(role_id.as_str())?;
    let permission = PermissionId::parse(payload.permission.as_str())?;

    state
        .security_admin_service
        .grant_permission(&user, &role_id, &permission)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_role_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<RolePermissionRequest>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::parse(role_id.as_str())?;
    let permission = PermissionId::parse(payload.permission.as_str())?;

    state
        .security_admin_service
        .revoke_permission(&user, &role_id, &permission)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn deactivate_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::parse(role_id.as_str())?;

    state
        .security_admin_service
        .deactivate_role(&user, &role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    let role_id = RoleId::parse(role_id.as_str())?;

    state
        .security_admin_service
        .delete_role(&user, &role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
