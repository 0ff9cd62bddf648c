use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    access::ensure_any,
    dto::feedbacks::{FeedbackList, StoreFeedbackRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Feedback,
    response::ApiResponse,
    services::feedback_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feedback", post(store_feedback))
        .route("/loadFeedbacks", get(load_feedbacks))
}

#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body = StoreFeedbackRequest,
    responses(
        (status = 200, description = "Submit feedback for an order", body = ApiResponse<Feedback>),
        (status = 422, description = "Validation failed"),
    ),
    tag = "Feedbacks"
)]
pub async fn store_feedback(
    State(state): State<AppState>,
    Json(payload): Json<StoreFeedbackRequest>,
) -> AppResult<Json<ApiResponse<Feedback>>> {
    let resp = feedback_service::store_feedback(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/loadFeedbacks",
    responses(
        (status = 200, description = "List feedback with orders", body = ApiResponse<FeedbackList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Feedbacks"
)]
pub async fn load_feedbacks(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<FeedbackList>>> {
    ensure_any(&user, &["Admin", "Manager"])?;
    let resp = feedback_service::list_feedbacks(&state).await?;
    Ok(Json(resp))
}
