use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::coupons;

/// Pricing knobs shared by the cart preview, the coupon preview and order
/// placement, so the three paths can never disagree on the shipping fee.
#[derive(Debug, Clone, Copy)]
pub struct PricingPolicy {
    pub shipping_fee: i64,
}

impl PricingPolicy {
    pub const DEFAULT_SHIPPING_FEE: i64 = 10;
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            shipping_fee: Self::DEFAULT_SHIPPING_FEE,
        }
    }
}

/// Closed set of coupon kinds. Anything else fails at decode/insert time
/// instead of silently producing a zero discount.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[sea_orm(string_value = "percentage")]
    Percentage,
    #[sea_orm(string_value = "direct")]
    Direct,
}

/// Why a coupon cannot be applied. The expired case shares one message with
/// the missing-coupon case so the API does not reveal which codes exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponRejection {
    ExpiredOrMissing,
    AlreadyUsed,
    EmptyOrder,
    BelowMinimum,
}

impl CouponRejection {
    pub fn message(&self) -> &'static str {
        match self {
            CouponRejection::ExpiredOrMissing => "Coupon does not exist or has expired",
            CouponRejection::AlreadyUsed => "Coupon has already been used",
            CouponRejection::EmptyOrder => "Cart not found",
            CouponRejection::BelowMinimum => "Order does not meet the coupon minimum",
        }
    }
}

/// Discount owed for `subtotal` under the coupon's terms.
///
/// Percentage coupons are clamped to `max_discount` when one is set; direct
/// coupons are a flat amount, uncapped.
pub fn discount_amount(coupon: &coupons::Model, subtotal: i64) -> i64 {
    match coupon.discount_type {
        DiscountType::Percentage => {
            let discount = subtotal * coupon.discount / 100;
            match coupon.max_discount {
                Some(cap) if discount > cap => cap,
                _ => discount,
            }
        }
        DiscountType::Direct => coupon.discount,
    }
}

/// Validate a coupon against a subtotal and compute its discount.
///
/// Checks run in order and the first failure wins: expiry, non-empty order,
/// minimum-order condition. The already-used check needs the database and is
/// the caller's job.
pub fn check_coupon(
    coupon: &coupons::Model,
    subtotal: i64,
    now: DateTime<Utc>,
) -> Result<i64, CouponRejection> {
    if now > coupon.end_date.with_timezone(&Utc) {
        return Err(CouponRejection::ExpiredOrMissing);
    }
    if subtotal == 0 {
        return Err(CouponRejection::EmptyOrder);
    }
    if subtotal < coupon.min_order {
        return Err(CouponRejection::BelowMinimum);
    }
    Ok(discount_amount(coupon, subtotal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn coupon(
        discount_type: DiscountType,
        discount: i64,
        max_discount: Option<i64>,
        min_order: i64,
        end_date: DateTime<Utc>,
    ) -> coupons::Model {
        coupons::Model {
            id: Uuid::new_v4(),
            code: "TEST".into(),
            discount_type,
            discount,
            max_discount,
            min_order,
            end_date: end_date.into(),
            created_at: Utc::now().into(),
        }
    }

    fn next_week() -> DateTime<Utc> {
        Utc::now() + Duration::days(7)
    }

    #[test]
    fn percentage_discount_is_clamped_to_cap() {
        let c = coupon(DiscountType::Percentage, 10, Some(50), 0, next_week());
        assert_eq!(check_coupon(&c, 1000, Utc::now()), Ok(50));
    }

    #[test]
    fn percentage_discount_below_cap_is_untouched() {
        let c = coupon(DiscountType::Percentage, 10, Some(50), 0, next_week());
        assert_eq!(check_coupon(&c, 300, Utc::now()), Ok(30));
    }

    #[test]
    fn uncapped_percentage_uses_full_amount() {
        let c = coupon(DiscountType::Percentage, 25, None, 0, next_week());
        assert_eq!(check_coupon(&c, 1000, Utc::now()), Ok(250));
    }

    #[test]
    fn direct_discount_is_flat_and_uncapped() {
        let c = coupon(DiscountType::Direct, 50, Some(10), 100, next_week());
        assert_eq!(check_coupon(&c, 200, Utc::now()), Ok(50));
    }

    #[test]
    fn expired_coupon_is_rejected_before_anything_else() {
        let c = coupon(DiscountType::Direct, 50, None, 1_000_000, Utc::now() - Duration::days(1));
        assert_eq!(
            check_coupon(&c, 200, Utc::now()),
            Err(CouponRejection::ExpiredOrMissing)
        );
    }

    #[test]
    fn zero_subtotal_is_rejected() {
        let c = coupon(DiscountType::Direct, 50, None, 0, next_week());
        assert_eq!(check_coupon(&c, 0, Utc::now()), Err(CouponRejection::EmptyOrder));
    }

    #[test]
    fn subtotal_below_minimum_is_rejected() {
        let c = coupon(DiscountType::Direct, 50, None, 500, next_week());
        assert_eq!(
            check_coupon(&c, 499, Utc::now()),
            Err(CouponRejection::BelowMinimum)
        );
    }

    #[test]
    fn evaluation_is_pure_and_repeatable() {
        let c = coupon(DiscountType::Percentage, 10, Some(50), 0, next_week());
        let first = check_coupon(&c, 1000, Utc::now());
        let second = check_coupon(&c, 1000, Utc::now());
        assert_eq!(first, second);
    }
}
