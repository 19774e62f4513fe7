use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::checkout::{ApplyCouponRequest, BuyNowQuery, CheckoutDto, CouponPreview},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_checkout))
        .route("/buy-now", get(get_buy_now_checkout))
        .route("/coupon", post(apply_coupon))
}

#[utoipa::path(
    get,
    path = "/api/checkout",
    responses(
        (status = 200, description = "Checkout page for the customer's cart", body = ApiResponse<CheckoutDto>),
        (status = 404, description = "Cart not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn get_checkout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CheckoutDto>>> {
    let resp = checkout_service::get_checkout(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/checkout/buy-now",
    params(
        ("product_id" = uuid::Uuid, Query, description = "Product to buy"),
        ("quantity" = i32, Query, description = "Quantity, must be >= 1")
    ),
    responses(
        (status = 200, description = "Checkout page for a one-item basket", body = ApiResponse<CheckoutDto>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn get_buy_now_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<BuyNowQuery>,
) -> AppResult<Json<ApiResponse<CheckoutDto>>> {
    let resp = checkout_service::get_buy_now_checkout(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checkout/coupon",
    request_body = ApplyCouponRequest,
    responses(
        (status = 200, description = "Coupon preview, nothing persisted", body = ApiResponse<CouponPreview>),
        (status = 400, description = "Coupon cannot be applied"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn apply_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ApplyCouponRequest>,
) -> AppResult<Json<ApiResponse<CouponPreview>>> {
    let resp = checkout_service::apply_coupon(&state, &user, payload).await?;
    Ok(Json(resp))
}
