use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::feedbacks::{FeedbackList, FeedbackWithOrder, StoreFeedbackRequest},
    entity::{
        feedbacks::{
            ActiveModel as FeedbackActive, Column as FeedbackCol, Entity as Feedbacks,
            Model as FeedbackModel,
        },
        orders::{Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    models::{Feedback, Order},
    response::{ApiResponse, Meta},
    state::AppState,
};

fn validate(payload: &StoreFeedbackRequest) -> AppResult<()> {
    let mut errors = BTreeMap::new();
    if let Some(rating) = payload.rating {
        if !(1..=5).contains(&rating) {
            errors.insert("rating".into(), "The rating must be between 1 and 5".into());
        }
    }
    if let Some(comment) = &payload.comment {
        if comment.len() > 1000 {
            errors.insert(
                "comment".into(),
                "The comment must not exceed 1000 characters".into(),
            );
        }
    }
    if let Some(email) = &payload.email {
        if !email.contains('@') {
            errors.insert("email".into(), "The email must be a valid email address".into());
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Public submission. No dedupe or rate limit; whoever holds an order id may
/// submit repeatedly (recorded product decision, see DESIGN.md).
pub async fn store_feedback(
    state: &AppState,
    payload: StoreFeedbackRequest,
) -> AppResult<ApiResponse<Feedback>> {
    validate(&payload)?;

    let order = Orders::find_by_id(payload.order_id).one(&state.orm).await?;
    if order.is_none() {
        return Err(AppError::field("order_id", "The selected order id is invalid"));
    }

    let feedback = FeedbackActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(payload.order_id),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        email: Set(payload.email),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Feedback submitted successfully",
        feedback_from_entity(feedback),
        Some(Meta::empty()),
    ))
}

pub async fn list_feedbacks(state: &AppState) -> AppResult<ApiResponse<FeedbackList>> {
    let rows = Feedbacks::find()
        .find_also_related(Orders)
        .order_by_desc(FeedbackCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let feedbacks = rows
        .into_iter()
        .map(|(feedback, order)| FeedbackWithOrder {
            feedback: feedback_from_entity(feedback),
            order: order.map(order_from_entity),
        })
        .collect();

    Ok(ApiResponse::success(
        "Feedbacks",
        FeedbackList { feedbacks },
        Some(Meta::empty()),
    ))
}

fn feedback_from_entity(model: FeedbackModel) -> Feedback {
    Feedback {
        id: model.id,
        order_id: model.order_id,
        rating: model.rating,
        comment: model.comment,
        email: model.email,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        total_amount: model.total_amount,
        amount_paid: model.amount_paid,
        change_amount: model.change_amount,
        discount: model.discount,
        payment_method: model.payment_method,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
