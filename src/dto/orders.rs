use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem, Product, User};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Server-authoritative placement request. Prices and totals are computed
/// from the product table, never taken from the client.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreOrderRequest {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub items: Vec<OrderLine>,
    pub payment_method: Option<String>,
    pub discount: Option<i32>,
    pub amount_paid: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemWithProduct {
    #[serde(flatten)]
    pub item: OrderItem,
    pub product: Option<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub user: Option<User>,
    pub order_items: Vec<OrderItemWithProduct>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub orders: Vec<OrderWithItems>,
}
