use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QuerySelect, RelationTrait, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::{
        checkout::SummaryItem,
        orders::{
            OrderConfirmation, OrderLineDto, OrderList, OrderWithItems, PaymentMethodSummary,
            PlaceOrderRequest,
        },
    },
    entity::{
        CartItems, PaymentMethods, Products,
        cart_items::{self, Column as CartCol},
        order_coupons::ActiveModel as OrderCouponActive,
        order_products::ActiveModel as OrderProductActive,
        orders::ActiveModel as OrderActive,
        payments::ActiveModel as PaymentActive,
        products::Column as ProdCol,
        shippings::ActiveModel as ShippingActive,
        used_coupons::ActiveModel as UsedCouponActive,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderProduct},
    notify::EmailJob,
    pricing::{CouponRejection, check_coupon},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::checkout_service::{ensure_customer, find_live_coupon},
    state::AppState,
};

const DELIVERY_LEAD_DAYS: i64 = 3;

const ORDER_STATUS_NEW: &str = "new";
const PAYMENT_STATUS_PENDING: &str = "pending";

#[derive(Debug, FromQueryResult)]
struct CartRow {
    product_id: Uuid,
    quantity: i32,
    name: String,
    photo_url: String,
    price: i64,
    discount: i64,
    color: Option<String>,
}

/// Place an order from the cart or from a buy-now basket.
///
/// The whole persistence sequence (shipping, payment, order, line items,
/// cart clear, coupon redemption) runs inside one database transaction, so
/// a failure at any step leaves nothing behind. The confirmation email is
/// dispatched only after the transaction commits and is best-effort.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderConfirmation>> {
    ensure_customer(&state.pool, user.user_id).await?;

    let method = PaymentMethods::find_by_id(payload.payment_method_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Payment method"))?;
    if !method.enabled {
        return Err(AppError::BadRequest(format!(
            "Payment method {} is under development",
            method.name
        )));
    }

    let txn = state.orm.begin().await?;

    // Snapshot the basket with live pricing inside the transaction.
    let items: Vec<SummaryItem> = match &payload.buy_now {
        Some(buy_now) => {
            if buy_now.quantity <= 0 {
                return Err(AppError::BadRequest(
                    "quantity must be greater than 0".to_string(),
                ));
            }
            let product = Products::find_by_id(buy_now.product_id)
                .one(&txn)
                .await?
                .ok_or(AppError::NotFound("Product"))?;
            let unit_price = product.price_after_discount();
            vec![SummaryItem {
                product_id: product.id,
                name: product.name,
                photo_url: product.photo_url,
                color: None,
                quantity: buy_now.quantity,
                unit_price,
                line_total: unit_price * buy_now.quantity as i64,
            }]
        }
        None => {
            let rows = CartItems::find()
                .select_only()
                .column(CartCol::ProductId)
                .column(CartCol::Quantity)
                .column_as(ProdCol::Name, "name")
                .column_as(ProdCol::PhotoUrl, "photo_url")
                .column_as(ProdCol::Price, "price")
                .column_as(ProdCol::Discount, "discount")
                .column_as(
                    crate::entity::product_colors::Column::Name,
                    "color",
                )
                .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
                .join(
                    JoinType::LeftJoin,
                    cart_items::Relation::ProductColors.def(),
                )
                .filter(CartCol::UserId.eq(user.user_id))
                .into_model::<CartRow>()
                .all(&txn)
                .await?;

            if rows.is_empty() {
                return Err(AppError::NotFound("Cart"));
            }

            rows.into_iter()
                .map(|row| {
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
                })
                .collect()
        }
    };

    let subtotal: i64 = items.iter().map(|i| i.line_total).sum();

    // Re-validate the coupon at placement; the preview holds nothing.
    let coupon = match payload.coupon_code.as_deref() {
        Some(code) => Some(find_live_coupon(state, code).await?),
        None => None,
    };
    let discount = match &coupon {
        Some(coupon) => check_coupon(coupon, subtotal, Utc::now())
            .map_err(|r| AppError::BadRequest(r.message().into()))?,
        None => 0,
    };

    let shipping_fee = state.pricing.shipping_fee;
    let final_cost = subtotal - discount + shipping_fee;

    let shipping = ShippingActive {
        id: Set(Uuid::new_v4()),
        delivery_date: Set((Utc::now() + Duration::days(DELIVERY_LEAD_DAYS)).into()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        payment_method_id: Set(method.id),
        amount: Set(final_cost),
        status: Set(PAYMENT_STATUS_PENDING.to_string()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        shipping_id: Set(shipping.id),
        payment_id: Set(payment.id),
        status: Set(ORDER_STATUS_NEW.to_string()),
        name: Set(payload.name.clone()),
        phone: Set(payload.phone.clone()),
        email: Set(payload.email.clone()),
        address: Set(payload.address.clone()),
        ship_name: Set(payload.ship_name.clone()),
        ship_phone: Set(payload.ship_phone.clone()),
        ship_address: Set(payload.ship_address.clone()),
        total_cost: Set(subtotal),
        cost_discount: Set(discount),
        shipping_cost: Set(shipping_fee),
        final_cost: Set(final_cost),
        note: Set(payload.note.clone().unwrap_or_default()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut lines: Vec<OrderLineDto> = Vec::with_capacity(items.len());
    for item in &items {
        let line = OrderProductActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            name: Set(item.name.clone()),
            photo_url: Set(item.photo_url.clone()),
            price: Set(item.unit_price),
            quantity: Set(item.quantity),
            cost_at_purchase: Set(item.line_total),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        lines.push(OrderLineDto {
            id: line.id,
            product_id: line.product_id,
            name: line.name,
            photo_url: line.photo_url,
            quantity: line.quantity,
            cost_at_purchase: line.cost_at_purchase,
        });
    }

    // Cart orders empty the cart; the customer keeps carting afterwards.
    if payload.buy_now.is_none() {
        CartItems::delete_many()
            .filter(CartCol::UserId.eq(user.user_id))
            .exec(&txn)
            .await?;
    }

    // Redemption is a conditional insert: the unique (coupon, customer) pair
    // turns a concurrent double-spend into a constraint violation here.
    if let Some(coupon) = &coupon {
        let redemption = UsedCouponActive {
            id: Set(Uuid::new_v4()),
            coupon_id: Set(coupon.id),
            user_id: Set(user.user_id),
            used_at: NotSet,
        }
        .insert(&txn)
        .await;
        if let Err(err) = redemption {
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                return Err(AppError::BadRequest(
                    CouponRejection::AlreadyUsed.message().into(),
                ));
            }
            return Err(err.into());
        }

        OrderCouponActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            coupon_id: Set(coupon.id),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_placed",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "final_cost": final_cost })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    if !order.email.is_empty() {
        state.notifier.enqueue(EmailJob {
            to: order.email.clone(),
            subject: format!("Order confirmation {}", order.id),
            html: render_confirmation_email(&order.name, &items, subtotal, shipping_fee, discount),
        });
    }

    let confirmation = OrderConfirmation {
        order_id: order.id,
        name: order.name,
        phone: order.phone,
        email: order.email,
        address: order.address,
        ship_address: order.ship_address,
        total_cost: order.total_cost,
        cost_discount: order.cost_discount,
        shipping_cost: order.shipping_cost,
        final_cost: order.final_cost,
        payment_method: PaymentMethodSummary {
            description: method.description,
        },
        items: lines,
    };

    Ok(ApiResponse::success(
        "Order placed",
        confirmation,
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "OK",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order: Option<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 AND id = $2")
            .bind(user.user_id)
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    let order = order.ok_or(AppError::NotFound("Order"))?;

    let items = sqlx::query_as::<_, OrderProduct>(
        "SELECT * FROM order_products WHERE order_id = $1 ORDER BY created_at",
    )
    .bind(order.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

fn render_confirmation_email(
    name: &str,
    items: &[SummaryItem],
    subtotal: i64,
    shipping_fee: i64,
    discount: i64,
) -> String {
    let mut rows = String::new();
    for item in items {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            item.name, item.quantity, item.line_total
        ));
    }
    let discount_row = if discount > 0 {
        format!("<tr><td colspan=\"2\">Discount</td><td>-{}</td></tr>", discount)
    } else {
        String::new()
    };
    format!(
        "<h1>Thank you for your order, {}!</h1>\
         <table>\
         <tr><th>Item</th><th>Qty</th><th>Total</th></tr>{}\
         <tr><td colspan=\"2\">Subtotal</td><td>{}</td></tr>\
         <tr><td colspan=\"2\">Shipping</td><td>{}</td></tr>{}\
         <tr><td colspan=\"2\"><strong>Total</strong></td><td><strong>{}</strong></td></tr>\
         </table>",
        name,
        rows,
        subtotal,
        shipping_fee,
        discount_row,
        subtotal + shipping_fee - discount
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_email_lists_items_and_totals() {
        let items = vec![SummaryItem {
            product_id: Uuid::new_v4(),
            name: "Widget".into(),
            photo_url: String::new(),
            color: None,
            quantity: 2,
            unit_price: 90,
            line_total: 180,
        }];
        let html = render_confirmation_email("Ada", &items, 180, 10, 0);
        assert!(html.contains("Widget"));
        assert!(html.contains("190"));
        assert!(!html.contains("Discount"));
    }

    #[test]
    fn confirmation_email_shows_discount_when_present() {
        let html = render_confirmation_email("Ada", &[], 200, 10, 50);
        assert!(html.contains("Discount"));
        assert!(html.contains("-50"));
        assert!(html.contains("160"));
    }
}
