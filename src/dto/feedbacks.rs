use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Feedback, Order};

#[derive(Debug, Deserialize, ToSchema)]
pub struct StoreFeedbackRequest {
    pub order_id: Uuid,
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackWithOrder {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub order: Option<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackList {
    pub feedbacks: Vec<FeedbackWithOrder>,
}
