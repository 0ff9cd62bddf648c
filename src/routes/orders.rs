use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderWithItems, StoreOrderRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/loadOrders", get(load_orders))
        .route("/storeOrder", post(store_order))
        .route("/getOrder/{id}", get(get_order))
        .route("/cancelOrder/{id}", put(cancel_order))
}

#[utoipa::path(
    get,
    path = "/api/loadOrders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc"),
    ),
    responses(
        (status = 200, description = "List orders with items", body = ApiResponse<OrderList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn load_orders(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/storeOrder",
    request_body = StoreOrderRequest,
    responses(
        (status = 200, description = "Place order", body = ApiResponse<OrderWithItems>),
        (status = 422, description = "Validation failed or insufficient stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn store_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<StoreOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::place_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/getOrder/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cancelOrder/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Cancel order and restore stock", body = ApiResponse<Order>),
        (status = 422, description = "Already cancelled"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::cancel_order(&state, &user, id).await?;
    Ok(Json(resp))
}
