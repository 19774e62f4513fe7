use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::checkout::{
        ApplyCouponRequest, BuyNowQuery, CheckoutDto, CouponPreview, OrderSummary, SummaryItem,
    },
    entity::{
        Coupons, UsedCoupons,
        coupons::{Column as CouponCol, Model as CouponModel},
        used_coupons::Column as UsedCol,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Address, PaymentMethod},
    pricing::{CouponRejection, check_coupon},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct CartPricingRow {
    product_id: Uuid,
    name: String,
    photo_url: String,
    price: i64,
    discount: i64,
    color: Option<String>,
    quantity: i32,
}

/// Checkout page for the customer's persisted cart.
///
/// Read-only: nothing is reserved or persisted until the order is placed.
pub async fn get_checkout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CheckoutDto>> {
    ensure_customer(&state.pool, user.user_id).await?;

    let items = cart_summary_items(&state.pool, user.user_id).await?;
    if items.is_empty() {
        return Err(AppError::NotFound("Cart"));
    }

    let summary = OrderSummary::from_items(items, state.pricing.shipping_fee);
    build_checkout_dto(state, user.user_id, summary).await
}

/// Checkout page for a one-item "buy now" basket that bypasses the cart.
pub async fn get_buy_now_checkout(
    state: &AppState,
    user: &AuthUser,
    query: BuyNowQuery,
) -> AppResult<ApiResponse<CheckoutDto>> {
    ensure_customer(&state.pool, user.user_id).await?;

    let item = buy_now_summary_item(&state.pool, query.product_id, query.quantity).await?;
    let summary = OrderSummary::from_items(vec![item], state.pricing.shipping_fee);
    build_checkout_dto(state, user.user_id, summary).await
}

/// Preview a coupon against the current basket.
///
/// Validation order: coupon exists and unexpired, not yet used by this
/// customer, basket non-empty, basket meets the minimum. Strictly read-only;
/// redemption happens only at order placement, so previewing any number of
/// times consumes nothing.
pub async fn apply_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: ApplyCouponRequest,
) -> AppResult<ApiResponse<CouponPreview>> {
    ensure_customer(&state.pool, user.user_id).await?;

    let subtotal = match (payload.product_id, payload.quantity) {
        (Some(product_id), quantity) => {
            let item =
                buy_now_summary_item(&state.pool, product_id, quantity.unwrap_or(1)).await?;
            item.line_total
        }
        _ => cart_summary_items(&state.pool, user.user_id)
            .await?
            .iter()
            .map(|i| i.line_total)
            .sum(),
    };

    let coupon = find_live_coupon(state, &payload.code).await?;

    let already_used = UsedCoupons::find()
        .filter(UsedCol::CouponId.eq(coupon.id))
        .filter(UsedCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .is_some();
    if already_used {
        return Err(AppError::BadRequest(
            CouponRejection::AlreadyUsed.message().into(),
        ));
    }

    let discount = check_coupon(&coupon, subtotal, Utc::now())
        .map_err(|r| AppError::BadRequest(r.message().into()))?;

    let preview = CouponPreview {
        code: coupon.code,
        subtotal,
        discount,
        shipping_fee: state.pricing.shipping_fee,
        total: subtotal - discount + state.pricing.shipping_fee,
    };
    Ok(ApiResponse::success("OK", preview, Some(Meta::empty())))
}

/// Look up a coupon by code, treating unknown and expired codes identically.
pub async fn find_live_coupon(state: &AppState, code: &str) -> AppResult<CouponModel> {
    Coupons::find()
        .filter(CouponCol::Code.eq(code))
        .one(&state.orm)
        .await?
        .filter(|c| Utc::now() <= c.end_date.with_timezone(&Utc))
        .ok_or_else(|| AppError::BadRequest(CouponRejection::ExpiredOrMissing.message().into()))
}

pub async fn ensure_customer(pool: &DbPool, user_id: Uuid) -> AppResult<()> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Customer"));
    }
    Ok(())
}

/// Cart lines joined with live product pricing, ready for summarizing.
pub async fn cart_summary_items(pool: &DbPool, user_id: Uuid) -> AppResult<Vec<SummaryItem>> {
    let rows = sqlx::query_as::<_, CartPricingRow>(
        r#"
        SELECT p.id AS product_id, p.name, p.photo_url, p.price, p.discount,
               pc.name AS color, ci.quantity
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        LEFT JOIN product_colors pc ON pc.id = ci.color_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(summary_item_from_row).collect())
}

pub async fn buy_now_summary_item(
    pool: &DbPool,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<SummaryItem> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let row: Option<CartPricingRow> = sqlx::query_as(
        r#"
        SELECT p.id AS product_id, p.name, p.photo_url, p.price, p.discount,
               NULL::text AS color, $2::int AS quantity
        FROM products p
        WHERE p.id = $1
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(pool)
    .await?;

    row.map(summary_item_from_row)
        .ok_or(AppError::NotFound("Product"))
}

fn summary_item_from_row(row: CartPricingRow) -> SummaryItem {
    let unit_price = row.price - row.discount;
    SummaryItem {
        product_id: row.product_id,
        name: row.name,
        photo_url: row.photo_url,
        color: row.color,
        quantity: row.quantity,
        unit_price,
        line_total: unit_price * row.quantity as i64,
    }
}

async fn build_checkout_dto(
    state: &AppState,
    user_id: Uuid,
    summary: OrderSummary,
) -> AppResult<ApiResponse<CheckoutDto>> {
    let addresses: Vec<Address> =
        sqlx::query_as("SELECT * FROM addresses WHERE user_id = $1 ORDER BY created_at")
            .bind(user_id)
            .fetch_all(&state.pool)
            .await?;

    let default_address = addresses.iter().find(|a| a.is_default).cloned();

    let payment_methods: Vec<PaymentMethod> =
        sqlx::query_as("SELECT * FROM payment_methods WHERE enabled ORDER BY name")
            .fetch_all(&state.pool)
            .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user_id),
        "checkout_view",
        Some("orders"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let data = CheckoutDto {
        addresses,
        default_address,
        payment_methods,
        summary,
    };
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}
