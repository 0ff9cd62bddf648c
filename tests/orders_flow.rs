use axum_pos_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::orders::{OrderLine, StoreOrderRequest},
    entity::{
        products::{ActiveModel as ProductActive, Entity as Products},
        roles::ActiveModel as RoleActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::order_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

// Integration flow: cashier places an order, totals and stock follow the
// fixed 12% tax rule, cancellation restores stock exactly once.
#[tokio::test]
async fn place_and_cancel_order_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let cashier = seed_cashier(&state, "cashier@example.com").await?;

    // 50.00 each, stock 10.
    let product = seed_product(&state, "Test Widget", 5_000, 10).await?;

    let resp = order_service::place_order(
        &state,
        &cashier,
        StoreOrderRequest {
            customer_name: Some("Walk-in".into()),
            customer_email: Some("walkin@example.com".into()),
            items: vec![OrderLine {
                product_id: product.id,
                quantity: 2,
            }],
            payment_method: Some("cash".into()),
            discount: Some(0),
            amount_paid: 15_000,
        },
    )
    .await?;
    let placed = resp.data.expect("order data");

    // subtotal 100.00, tax 12.00, total 112.00, change 38.00
    assert_eq!(placed.order.total_amount, 11_200);
    assert_eq!(placed.order.change_amount, 3_800);
    assert_eq!(placed.order.status, "completed");
    assert_eq!(placed.order_items.len(), 1);
    assert_eq!(placed.order_items[0].item.price, 5_000);
    assert_eq!(placed.order_items[0].item.subtotal, 10_000);

    let stock_after = fetch_stock(&state, product.id).await?;
    assert_eq!(stock_after, 8);

    // Item price stays frozen when the product price changes afterwards.
    let mut active: axum_pos_api::entity::products::ActiveModel =
        Products::find_by_id(product.id)
            .one(&state.orm)
            .await?
            .expect("product")
            .into();
    active.price = Set(9_999);
    active.update(&state.orm).await?;

    let fetched = order_service::get_order(&state, placed.order.id).await?;
    let fetched = fetched.data.expect("order data");
    assert_eq!(fetched.order_items[0].item.price, 5_000);

    // Cancellation restores the stock and flips the status.
    let cancelled = order_service::cancel_order(&state, &cashier, placed.order.id).await?;
    assert_eq!(cancelled.data.expect("order").status, "cancelled");
    assert_eq!(fetch_stock(&state, product.id).await?, 10);

    // A second cancellation is a business-rule conflict.
    let again = order_service::cancel_order(&state, &cashier, placed.order.id).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
    assert_eq!(fetch_stock(&state, product.id).await?, 10);

    Ok(())
}

#[tokio::test]
async fn insufficient_stock_leaves_no_partial_writes() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let cashier = seed_cashier(&state, "cashier2@example.com").await?;
    let plenty = seed_product(&state, "Plenty", 1_000, 50).await?;
    let scarce = seed_product(&state, "Scarce", 2_000, 1).await?;

    let result = order_service::place_order(
        &state,
        &cashier,
        StoreOrderRequest {
            customer_name: None,
            customer_email: None,
            items: vec![
                OrderLine {
                    product_id: plenty.id,
                    quantity: 3,
                },
                OrderLine {
                    product_id: scarce.id,
                    quantity: 2,
                },
            ],
            payment_method: None,
            discount: None,
            amount_paid: 100_000,
        },
    )
    .await;

    match result {
        Err(AppError::Conflict(message)) => {
            assert!(message.contains("Scarce"), "conflict names the product");
        }
        other => panic!("expected stock conflict, got {other:?}"),
    }

    // The whole placement rolled back, including the in-stock line.
    assert_eq!(fetch_stock(&state, plenty.id).await?, 50);
    assert_eq!(fetch_stock(&state, scarce.id).await?, 1);

    let order_count: (i64,) =
        sqlx::query_as("SELECT count(*) FROM orders WHERE user_id = $1")
            .bind(cashier.user_id)
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(order_count.0, 0);

    Ok(())
}

#[tokio::test]
async fn underpayment_is_rejected_server_side() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let cashier = seed_cashier(&state, "cashier3@example.com").await?;
    let product = seed_product(&state, "Pricey", 10_000, 5).await?;

    let result = order_service::place_order(
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
            // total is 11_200 after tax
            amount_paid: 11_000,
        },
    )
    .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(fetch_stock(&state, product.id).await?, 5);

    Ok(())
}

#[tokio::test]
async fn concurrent_orders_cannot_overdraw_stock() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let cashier = seed_cashier(&state, "cashier4@example.com").await?;
    let product = seed_product(&state, "Last One", 5_000, 1).await?;

    let request = |product_id| StoreOrderRequest {
        customer_name: None,
        customer_email: None,
        items: vec![OrderLine {
            product_id,
            quantity: 1,
        }],
        payment_method: None,
        discount: None,
        amount_paid: 10_000,
    };

    let state_a = state.clone();
    let state_b = state.clone();
    let cashier_a = cashier.clone();
    let cashier_b = cashier.clone();
    let id = product.id;

    let (a, b) = tokio::join!(
        tokio::spawn(async move {
            order_service::place_order(&state_a, &cashier_a, request(id)).await
        }),
        tokio::spawn(async move {
            order_service::place_order(&state_b, &cashier_b, request(id)).await
        }),
    );
    let results = [a?, b?];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::Conflict(_))))
        .count();
    assert_eq!(successes, 1, "exactly one order wins the last unit");
    assert_eq!(conflicts, 1, "the loser reports insufficient stock");
    assert_eq!(fetch_stock(&state, product.id).await?, 0);

    Ok(())
}

// Allow skipping when no DB is configured in the environment.
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

// Fixtures get a random suffix so repeated and parallel runs never collide
// on the unique name/email columns.
async fn seed_cashier(state: &AppState, email: &str) -> anyhow::Result<AuthUser> {
    let suffix = Uuid::new_v4().simple().to_string();
    let role = RoleActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Cashier-{suffix}")),
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
        last_name: Set("Cashier".into()),
        suffix_name: Set(None),
        age: Set(25),
        gender: Set("others".into()),
        contact: Set("0000".into()),
        address: Set("Test Street".into()),
        role_id: Set(role.id),
        email: Set(format!("{suffix}-{email}")),
        password_hash: Set("dummy".into()),
        profile_image: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: "Cashier".into(),
    })
}

async fn seed_product(
    state: &AppState,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<axum_pos_api::entity::products::Model> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("{name}-{}", Uuid::new_v4().simple())),
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

async fn fetch_stock(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .expect("product exists");
    Ok(product.stock)
}
