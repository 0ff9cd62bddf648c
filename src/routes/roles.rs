use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    access::ensure_admin,
    dto::roles::{RoleList, StoreRoleRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Role,
    response::ApiResponse,
    services::role_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/loadRoles", get(load_roles))
        .route("/storeRole", post(store_role))
        .route("/updateRole/{id}", put(update_role))
        .route("/deleteRole/{id}", delete(delete_role))
}

#[utoipa::path(
    get,
    path = "/api/loadRoles",
    responses(
        (status = 200, description = "List roles", body = ApiResponse<RoleList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn load_roles(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RoleList>>> {
    ensure_admin(&user)?;
    let resp = role_service::list_roles(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/storeRole",
    request_body = StoreRoleRequest,
    responses(
        (status = 200, description = "Create role", body = ApiResponse<Role>),
        (status = 422, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn store_role(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<StoreRoleRequest>,
) -> AppResult<Json<ApiResponse<Role>>> {
    ensure_admin(&user)?;
    let resp = role_service::store_role(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/updateRole/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    request_body = StoreRoleRequest,
    responses(
        (status = 200, description = "Update role", body = ApiResponse<Role>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn update_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StoreRoleRequest>,
) -> AppResult<Json<ApiResponse<Role>>> {
    ensure_admin(&user)?;
    let resp = role_service::update_role(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/deleteRole/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Delete role"),
        (status = 422, description = "Role still has users"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn delete_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;
    let resp = role_service::delete_role(&state, &user, id).await?;
    Ok(Json(resp))
}
