use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderProduct};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BuyNowItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub ship_name: Option<String>,
    pub ship_phone: Option<String>,
    pub ship_address: Option<String>,
    pub payment_method_id: Uuid,
    pub coupon_code: Option<String>,
    pub note: Option<String>,
    /// Present for "buy now"; absent means the order comes from the cart.
    pub buy_now: Option<BuyNowItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentMethodSummary {
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineDto {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub photo_url: String,
    pub quantity: i32,
    pub cost_at_purchase: i64,
}

/// Client-facing confirmation returned from order placement.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderConfirmation {
    pub order_id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub ship_address: Option<String>,
    pub total_cost: i64,
    pub cost_discount: i64,
    pub shipping_cost: i64,
    pub final_cost: i64,
    pub payment_method: PaymentMethodSummary,
    pub items: Vec<OrderLineDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderProduct>,
}
