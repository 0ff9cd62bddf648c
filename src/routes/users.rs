use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    access::ensure_admin,
    dto::users::{StoreUserRequest, UserList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/loadUsers", get(load_users))
        .route("/storeUser", post(store_user))
        .route("/updateUser/{id}", put(update_user))
        .route("/deleteUser/{id}", delete(delete_user))
}

#[utoipa::path(
    get,
    path = "/api/loadUsers",
    responses(
        (status = 200, description = "List users with roles", body = ApiResponse<UserList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn load_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserList>>> {
    ensure_admin(&user)?;
    let resp = user_service::list_users(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/storeUser",
    request_body = StoreUserRequest,
    responses(
        (status = 200, description = "Create user", body = ApiResponse<User>),
        (status = 422, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn store_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<StoreUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    ensure_admin(&user)?;
    let resp = user_service::store_user(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/updateUser/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = StoreUserRequest,
    responses(
        (status = 200, description = "Update user", body = ApiResponse<User>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StoreUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    ensure_admin(&user)?;
    let resp = user_service::update_user(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/deleteUser/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Delete user"),
        (status = 422, description = "User still has orders"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;
    let resp = user_service::delete_user(&state, &user, id).await?;
    Ok(Json(resp))
}
