use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{CartLineDto, CartList},
        checkout::{ApplyCouponRequest, CheckoutDto, CouponPreview, OrderSummary, SummaryItem},
        orders::{
            OrderConfirmation, OrderLineDto, OrderList, OrderWithItems, PaymentMethodSummary,
            PlaceOrderRequest,
        },
        products::{ProductDetail, ProductList},
        wishlist::WishlistProductList,
    },
    models::{
        Address, CartItem, Order, OrderProduct, PaymentMethod, Product, ProductColor, User,
        WishlistItem,
    },
    response::{ApiResponse, Meta},
    routes::{auth, cart, checkout, health, orders, params, products, wishlist},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        products::list_products,
        products::get_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        checkout::get_checkout,
        checkout::get_buy_now_checkout,
        checkout::apply_coupon,
        orders::place_order,
        orders::list_orders,
        orders::get_order,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist
    ),
    components(
        schemas(
            User,
            Address,
            Product,
            ProductColor,
            CartItem,
            PaymentMethod,
            Order,
            OrderProduct,
            WishlistItem,
            ProductList,
            ProductDetail,
            CartList,
            CartLineDto,
            CheckoutDto,
            OrderSummary,
            SummaryItem,
            ApplyCouponRequest,
            CouponPreview,
            PlaceOrderRequest,
            OrderConfirmation,
            OrderLineDto,
            PaymentMethodSummary,
            OrderList,
            OrderWithItems,
            WishlistProductList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CheckoutDto>,
            ApiResponse<CouponPreview>,
            ApiResponse<OrderConfirmation>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Checkout", description = "Checkout summary and coupon preview"),
        (name = "Orders", description = "Order placement and history"),
        (name = "Wishlist", description = "Wishlist endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
