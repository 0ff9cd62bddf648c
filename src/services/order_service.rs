use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{OrderItemWithProduct, OrderList, OrderWithItems, StoreOrderRequest},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    notify::{self, NotifyItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{product_service::product_from_entity, user_service::user_from_entity},
    state::AppState,
};

/// Fixed sales tax, percent of the pre-discount subtotal.
const TAX_RATE_PERCENT: i64 = 12;

#[derive(Debug, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: i64,
    pub tax: i64,
    pub discount_amount: i64,
    pub total: i64,
}

/// Totals arithmetic in integer cents, truncating division. The discount
/// applies to the taxed amount and the total never goes below zero.
pub fn compute_totals(subtotal: i64, discount_percent: i32) -> OrderTotals {
    let tax = subtotal * TAX_RATE_PERCENT / 100;
    let discount_amount = (subtotal + tax) * discount_percent as i64 / 100;
    let total = (subtotal + tax - discount_amount).max(0);
    OrderTotals {
        subtotal,
        tax,
        discount_amount,
        total,
    }
}

fn validate(payload: &StoreOrderRequest) -> AppResult<()> {
    let mut errors = BTreeMap::new();
    if payload.items.is_empty() {
        errors.insert("items".into(), "The items field is required".into());
    }
    for (idx, line) in payload.items.iter().enumerate() {
        if line.quantity < 1 {
            errors.insert(
                format!("items.{idx}.quantity"),
                "The quantity must be at least 1".into(),
            );
        }
    }
    if payload.amount_paid < 0 {
        errors.insert("amountPaid".into(), "The amount paid must be at least 0".into());
    }
    if let Some(discount) = payload.discount {
        if !(0..=100).contains(&discount) {
            errors.insert(
                "discount".into(),
                "The discount must be between 0 and 100".into(),
            );
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut hydrated = Vec::with_capacity(orders.len());
    for order in orders {
        hydrated.push(hydrate_order(state, order).await?);
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { orders: hydrated },
        Some(meta),
    ))
}

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: StoreOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    validate(&payload)?;
    let discount_percent = payload.discount.unwrap_or(0);

    let txn = state.orm.begin().await?;

    // Lock each product row up front so the stock check and the decrement
    // are serialized against concurrent placements.
    let mut products: BTreeMap<Uuid, ProductModel> = BTreeMap::new();
    let mut needed: BTreeMap<Uuid, i64> = BTreeMap::new();
    for line in &payload.items {
        if !products.contains_key(&line.product_id) {
            let product = Products::find_by_id(line.product_id)
                .lock(LockType::Update)
                .one(&txn)
                .await?;
            let product = match product {
                Some(p) => p,
                None => {
                    return Err(AppError::field("items", "The selected product is invalid"));
                }
            };
            products.insert(line.product_id, product);
        }
        *needed.entry(line.product_id).or_insert(0) += line.quantity as i64;
    }

    let mut subtotal: i64 = 0;
    for (product_id, quantity) in &needed {
        let product = &products[product_id];
        if (product.stock as i64) < *quantity {
            return Err(AppError::Conflict(format!(
                "Insufficient stock for product: {}",
                product.name
            )));
        }
        subtotal += product.price * quantity;
    }

    let totals = compute_totals(subtotal, discount_percent);
    let change = payload.amount_paid - totals.total;
    if change < 0 {
        return Err(AppError::field(
            "amountPaid",
            "The amount paid is less than the order total",
        ));
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Some(user.user_id)),
        customer_name: Set(payload.customer_name.clone()),
        customer_email: Set(payload.customer_email.clone()),
        total_amount: Set(totals.total),
        amount_paid: Set(payload.amount_paid),
        change_amount: Set(change),
        discount: Set(discount_percent),
        payment_method: Set(payload
            .payment_method
            .clone()
            .unwrap_or_else(|| "cash".to_string())),
        status: Set("completed".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItemWithProduct> = Vec::new();
    let mut notify_items: Vec<NotifyItem> = Vec::new();
    for line in &payload.items {
        let product = &products[&line.product_id];
        // Unit price frozen at sale time; later product edits do not touch it.
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(product.price),
            subtotal: Set(product.price * line.quantity as i64),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        notify_items.push(NotifyItem {
            product_name: product.name.clone(),
            quantity: item.quantity,
            price: item.price,
            subtotal: item.subtotal,
        });
        items.push(OrderItemWithProduct {
            item: order_item_from_entity(item),
            product: Some(product_from_entity(product.clone())),
        });
    }

    for (product_id, quantity) in &needed {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(*quantity))
            .filter(ProdCol::Id.eq(*product_id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    notify::spawn_order_confirmation(
        order.id,
        order.customer_name.clone(),
        order.customer_email.clone(),
        order.total_amount,
        notify_items,
    );

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_place",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed successfully",
        OrderWithItems {
            order: order_from_entity(order),
            user: None,
            order_items: items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let data = hydrate_order(state, order).await?;
    Ok(ApiResponse::success("Order", data, Some(Meta::empty())))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.status == "cancelled" {
        return Err(AppError::Conflict("Order is already cancelled".into()));
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;

    for item in &items {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(&txn)
            .await?;
    }

    let mut active: OrderActive = order.into();
    active.status = Set("cancelled".into());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_cancel",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order cancelled successfully",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

async fn hydrate_order(state: &AppState, order: OrderModel) -> AppResult<OrderWithItems> {
    let cashier = match order.user_id {
        Some(user_id) => Users::find()
            .filter(UserCol::Id.eq(user_id))
            .one(&state.orm)
            .await?
            .map(user_from_entity),
        None => None,
    };

    let order_items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .find_also_related(Products)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(item, product)| OrderItemWithProduct {
            item: order_item_from_entity(item),
            product: product.map(product_from_entity),
        })
        .collect();

    Ok(OrderWithItems {
        order: order_from_entity(order),
        user: cashier,
        order_items,
    })
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

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
        subtotal: model.subtotal,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_match_worked_example() {
        // Cart of [{price 50.00, qty 2}] with no discount.
        let totals = compute_totals(10_000, 0);
        assert_eq!(totals.tax, 1_200);
        assert_eq!(totals.discount_amount, 0);
        assert_eq!(totals.total, 11_200);
        // Paid 150.00 -> change 38.00.
        assert_eq!(15_000 - totals.total, 3_800);
    }

    #[test]
    fn discount_applies_to_taxed_amount() {
        let totals = compute_totals(10_000, 10);
        assert_eq!(totals.tax, 1_200);
        assert_eq!(totals.discount_amount, 1_120);
        assert_eq!(totals.total, 10_080);
    }

    #[test]
    fn full_discount_reaches_zero_but_not_below() {
        let totals = compute_totals(10_000, 100);
        assert_eq!(totals.discount_amount, 11_200);
        assert_eq!(totals.total, 0);
    }

    #[test]
    fn truncating_division_is_stable() {
        // 12% of 99 cents truncates to 11 cents.
        let totals = compute_totals(99, 0);
        assert_eq!(totals.tax, 11);
        assert_eq!(totals.total, 110);
    }

    #[test]
    fn invariant_subtotal_plus_tax_minus_discount() {
        for subtotal in [0_i64, 1, 999, 10_000, 123_456_789] {
            for discount in [0, 1, 12, 50, 99, 100] {
                let t = compute_totals(subtotal, discount);
                assert_eq!(t.total, (t.subtotal + t.tax - t.discount_amount).max(0));
            }
        }
    }
}
