use super::{created, Created};
use crate::domain::{PermissionCheck, PermissionQuery, Role, RoleAssignment, RoleInput, UserRole};
use crate::error::Result;
use crate::permissions;
use crate::server::{ApiJson, ApiPath, ApiQuery, AppState};
use crate::storage::roles;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>> {
    Ok(Json(state.db.call(|conn| roles::list_roles(conn)).await?))
}

pub async fn get_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Role>> {
    Ok(Json(state.db.call(move |conn| roles::get_role(conn, id)).await?))
}

pub async fn create_role(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RoleInput>,
) -> Result<Created<Role>> {
    let role = state
        .db
        .call(move |conn| roles::insert_role(conn, &input))
        .await?;
    Ok(created(role))
}

pub async fn update_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<RoleInput>,
) -> Result<Json<Role>> {
    let role = state
        .db
        .call(move |conn| roles::update_role(conn, id, &input))
        .await?;
    Ok(Json(role))
}

pub async fn delete_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.db.call(move |conn| roles::delete_role(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_user_roles(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<Json<Vec<UserRole>>> {
    let held = state
        .db
        .call(move |conn| roles::user_roles(conn, &user_id))
        .await?;
    Ok(Json(held))
}

pub async fn assign_role(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
    ApiJson(assignment): ApiJson<RoleAssignment>,
) -> Result<Created<Vec<UserRole>>> {
    let held = state
        .db
        .call(move |conn| roles::assign_role(conn, &user_id, assignment.role_id))
        .await?;
    Ok(created(held))
}

pub async fn revoke_role(
    State(state): State<AppState>,
    ApiPath((user_id, role_id)): ApiPath<(String, i64)>,
) -> Result<StatusCode> {
    state
        .db
        .call(move |conn| roles::revoke_role(conn, &user_id, role_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn user_permissions(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<Json<Value>> {
    let merged = state
        .db
        .call(move |conn| roles::effective_permissions(conn, &user_id))
        .await?;
    Ok(Json(merged))
}

pub async fn check_permission(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<PermissionQuery>,
) -> Result<Json<PermissionCheck>> {
    let merged = state
        .db
        .call(move |conn| roles::effective_permissions(conn, &user_id))
        .await?;
    let granted = permissions::is_granted(&merged, &query.path);
    Ok(Json(PermissionCheck {
        path: query.path,
        granted,
    }))
}
