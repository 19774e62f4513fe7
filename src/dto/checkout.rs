use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Address, PaymentMethod};

/// One line of the checkout summary, priced at the product's current
/// price-after-discount.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SummaryItem {
    pub product_id: Uuid,
    pub name: String,
    pub photo_url: String,
    pub color: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

/// Derived view of a basket. Recomputed on every request, never stored.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderSummary {
    pub items: Vec<SummaryItem>,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub discount: i64,
    pub total: i64,
    pub item_count: i64,
}

impl OrderSummary {
    /// Totals before any coupon: discount stays 0 and enters only through
    /// the coupon preview / order placement.
    pub fn from_items(items: Vec<SummaryItem>, shipping_fee: i64) -> Self {
        let subtotal: i64 = items.iter().map(|i| i.line_total).sum();
        let item_count: i64 = items.iter().map(|i| i.quantity as i64).sum();
        Self {
            items,
            subtotal,
            shipping_fee,
            discount: 0,
            total: subtotal + shipping_fee,
            item_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutDto {
    pub addresses: Vec<Address>,
    pub default_address: Option<Address>,
    pub payment_methods: Vec<PaymentMethod>,
    pub summary: OrderSummary,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BuyNowQuery {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyCouponRequest {
    pub code: String,
    /// Present for the buy-now basket; absent means the real cart.
    pub product_id: Option<Uuid>,
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponPreview {
    pub code: String,
    pub subtotal: i64,
    pub discount: i64,
    pub shipping_fee: i64,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i32, unit_price: i64) -> SummaryItem {
        SummaryItem {
            product_id: Uuid::new_v4(),
            name: "item".into(),
            photo_url: String::new(),
            color: None,
            quantity,
            unit_price,
            line_total: unit_price * quantity as i64,
        }
    }

    #[test]
    fn summary_totals_add_the_shipping_fee() {
        let summary = OrderSummary::from_items(vec![item(2, 40), item(1, 100)], 10);
        assert_eq!(summary.subtotal, 180);
        assert_eq!(summary.discount, 0);
        assert_eq!(summary.total, 190);
        assert_eq!(summary.item_count, 3);
    }

    #[test]
    fn empty_summary_is_just_the_fee() {
        let summary = OrderSummary::from_items(Vec::new(), 10);
        assert_eq!(summary.subtotal, 0);
        assert_eq!(summary.total, 10);
        assert_eq!(summary.item_count, 0);
    }
}
