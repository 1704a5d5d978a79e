use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use sitebeam_application::{CreateRoleInput, GrantAssignmentInput};
use sitebeam_core::{UserId, UserIdentity};
use sitebeam_domain::{PermissionId, RoleId, Scope};

use crate::dto::{
    AssignmentResponse, AssignmentsQuery, CreateRoleRequest, GrantAssignmentRequest,
    RevokeAssignmentRequest, RolePermissionRequest, RoleResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod assignments;
mod roles;

pub use assignments::{
    grant_assignment_handler, list_assignments_handler, revoke_assignment_handler,
};
pub use roles::{
    create_role_handler, deactivate_role_handler, delete_role_handler,
    grant_role_permission_handler, list_roles_handler, revoke_role_permission_handler,
};
