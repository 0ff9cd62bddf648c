use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use sea_orm::EntityTrait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    access::{self, NavItem},
    dto::auth::{LoginRequest, LoginResponse},
    dto::users::UserWithRole,
    entity::{roles::Entity as Roles, users::Entity as Users},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/user", get(whoami))
        .route("/navigation", get(navigation))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NavigationData {
    pub items: Vec<NavItem>,
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/logout", security(("bearer_auth" = [])), tag = "Auth")]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::logout(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "Current profile with role", body = ApiResponse<UserWithRole>),
        (status = 401, description = "Invalid session or unresolvable role"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn whoami(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserWithRole>>> {
    let resp = auth_service::whoami(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/navigation",
    responses(
        (status = 200, description = "Navigation items visible to the caller", body = ApiResponse<NavigationData>),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn navigation(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<NavigationData>>> {
    // Resolve against the database rather than trusting the token's role
    // claim, so a deleted role degrades to the safe default immediately.
    let role = match Users::find_by_id(user.user_id)
        .find_also_related(Roles)
        .one(&state.orm)
        .await?
    {
        Some((_, role)) => role,
        None => None,
    };

    let items = access::nav_items(role.as_ref().map(|r| r.name.as_str())).to_vec();
    Ok(Json(ApiResponse::success(
        "Navigation",
        NavigationData { items },
        Some(Meta::empty()),
    )))
}
