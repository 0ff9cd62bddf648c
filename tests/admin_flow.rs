use axum_pos_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::feedbacks::StoreFeedbackRequest,
    dto::orders::{OrderLine, StoreOrderRequest},
    entity::{
        products::ActiveModel as ProductActive,
        roles::{ActiveModel as RoleActive, Entity as Roles},
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{auth_service, feedback_service, order_service, role_service, user_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

#[tokio::test]
async fn deleting_user_with_orders_is_blocked() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin = seed_user(&state, "Admin").await?;
    let cashier = seed_user(&state, "Cashier").await?;
    let product = seed_product(&state, 5_000, 10).await?;

    order_service::place_order(
        &state,
        &cashier,
        StoreOrderRequest {
            customer_name: None,
            customer_email: None,
            items: vec![OrderLine {
                product_id: product.id,
                quantity: 1,
            }],
            payment_method: None,
            discount: None,
            amount_paid: 10_000,
        },
    )
    .await?;

    let result = user_service::delete_user(&state, &admin, cashier.user_id).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    // The user survives the failed delete.
    let still_there = Users::find_by_id(cashier.user_id).one(&state.orm).await?;
    assert!(still_there.is_some());

    Ok(())
}

#[tokio::test]
async fn deleting_role_with_users_is_blocked() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin = seed_user(&state, "Admin").await?;
    let member = seed_user(&state, "Cashier").await?;

    let member_entity = Users::find_by_id(member.user_id)
        .one(&state.orm)
        .await?
        .expect("user");

    let result = role_service::delete_role(&state, &admin, member_entity.role_id).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let still_there = Roles::find_by_id(member_entity.role_id)
        .one(&state.orm)
        .await?;
    assert!(still_there.is_some());

    Ok(())
}

#[tokio::test]
async fn feedback_requires_an_existing_order() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let cashier = seed_user(&state, "Cashier").await?;
    let product = seed_product(&state, 5_000, 10).await?;

    let placed = order_service::place_order(
        &state,
        &cashier,
        StoreOrderRequest {
            customer_name: Some("Walk-in".into()),
            customer_email: None,
            items: vec![OrderLine {
                product_id: product.id,
                quantity: 1,
            }],
            payment_method: None,
            discount: None,
            amount_paid: 10_000,
        },
    )
    .await?
    .data
    .expect("order");

    // Valid submission against a real order.
    let ok = feedback_service::store_feedback(
        &state,
        StoreFeedbackRequest {
            order_id: placed.order.id,
            rating: Some(5),
            comment: Some("Great service".into()),
            email: None,
        },
    )
    .await?;
    assert_eq!(ok.data.expect("feedback").rating, Some(5));

    // Unknown order id is a field-keyed validation failure.
    let missing = feedback_service::store_feedback(
        &state,
        StoreFeedbackRequest {
            order_id: Uuid::new_v4(),
            rating: Some(4),
            comment: None,
            email: None,
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::Validation(_))));

    // Out-of-range rating is rejected before touching the database.
    let bad_rating = feedback_service::store_feedback(
        &state,
        StoreFeedbackRequest {
            order_id: placed.order.id,
            rating: Some(6),
            comment: None,
            email: None,
        },
    )
    .await;
    assert!(matches!(bad_rating, Err(AppError::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn whoami_fails_once_the_user_is_gone() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let admin = seed_user(&state, "Admin").await?;
    let cashier = seed_user(&state, "Cashier").await?;

    let before = auth_service::whoami(&state, &cashier).await?;
    assert!(before.data.expect("profile").role.is_some());

    user_service::delete_user(&state, &admin, cashier.user_id).await?;

    // The stale token no longer resolves to a session.
    let after = auth_service::whoami(&state, &cashier).await;
    assert!(matches!(after, Err(AppError::Unauthorized)));

    Ok(())
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    Ok(Some(AppState { pool, orm }))
}

async fn seed_user(state: &AppState, role_label: &str) -> anyhow::Result<AuthUser> {
    let suffix = Uuid::new_v4().simple().to_string();
    let role = RoleActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("{role_label}-{suffix}")),
        description: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        first_name: Set("Test".into()),
        middle_name: Set(None),
        last_name: Set(role_label.to_string()),
        suffix_name: Set(None),
        age: Set(30),
        gender: Set("others".into()),
        contact: Set("0000".into()),
        address: Set("Test Street".into()),
        role_id: Set(role.id),
        email: Set(format!("{suffix}@example.com")),
        password_hash: Set("dummy".into()),
        profile_image: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: role_label.to_string(),
    })
}

async fn seed_product(
    state: &AppState,
    price: i64,
    stock: i32,
) -> anyhow::Result<axum_pos_api::entity::products::Model> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Product-{}", Uuid::new_v4().simple())),
        price: Set(price),
        stock: Set(stock),
        image_path: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}
