use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    access::ensure_any,
    dto::products::{ProductList, StoreProductRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Product,
    response::ApiResponse,
    routes::params::ProductQuery,
    services::product_service,
    state::AppState,
};

const PRODUCT_MANAGERS: &[&str] = &["Admin", "Manager"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/loadProducts", get(load_products))
        .route("/storeProduct", post(store_product))
        .route("/updateProduct/{id}", put(update_product))
        .route("/deleteProduct/{id}", delete(delete_product))
}

#[utoipa::path(
    get,
    path = "/api/loadProducts",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Name search"),
    ),
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn load_products(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/storeProduct",
    request_body = StoreProductRequest,
    responses(
        (status = 200, description = "Create product", body = ApiResponse<Product>),
        (status = 422, description = "Validation failed"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn store_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<StoreProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_any(&user, PRODUCT_MANAGERS)?;
    let resp = product_service::store_product(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/updateProduct/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = StoreProductRequest,
    responses(
        (status = 200, description = "Update product", body = ApiResponse<Product>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StoreProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_any(&user, PRODUCT_MANAGERS)?;
    let resp = product_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/deleteProduct/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Delete product"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_any(&user, PRODUCT_MANAGERS)?;
    let resp = product_service::delete_product(&state, &user, id).await?;
    Ok(Json(resp))
}
