use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod doc;
pub mod feedbacks;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod roles;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(roles::router())
        .merge(users::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(feedbacks::router())
}
