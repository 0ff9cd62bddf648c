use serde::Serialize;
use uuid::Uuid;

/// Per-line summary sent to the order confirmation webhook.
#[derive(Debug, Clone, Serialize)]
pub struct NotifyItem {
    pub product_name: String,
    pub quantity: i32,
    pub price: i64,
    pub subtotal: i64,
}

#[derive(Debug, Serialize)]
struct OrderConfirmation {
    order_id: Uuid,
    customer_name: Option<String>,
    customer_email: Option<String>,
    total_amount: i64,
    order_items: Vec<NotifyItem>,
    feedback_link: String,
}

/// Fire-and-forget order confirmation. Runs detached from the request so a
/// slow or unreachable webhook cannot delay or fail the checkout response.
pub fn spawn_order_confirmation(
    order_id: Uuid,
    customer_name: Option<String>,
    customer_email: Option<String>,
    total_amount: i64,
    order_items: Vec<NotifyItem>,
) {
    let webhook_url = match std::env::var("ORDER_WEBHOOK_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => {
            tracing::warn!("order webhook URL not configured, skipping notification");
            return;
        }
    };
    let frontend_url =
        std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

    let payload = OrderConfirmation {
        order_id,
        customer_name,
        customer_email,
        total_amount,
        order_items,
        feedback_link: format!("{frontend_url}/feedback/{order_id}"),
    };

    tokio::spawn(async move {
        let client = reqwest::Client::new();
        match client.post(&webhook_url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(order_id = %payload.order_id, "order confirmation sent");
            }
            Ok(resp) => {
                tracing::warn!(
                    order_id = %payload.order_id,
                    status = %resp.status(),
                    "order confirmation webhook rejected"
                );
            }
            Err(err) => {
                tracing::warn!(
                    order_id = %payload.order_id,
                    error = %err,
                    "failed to send order confirmation"
                );
            }
        }
    });
}
