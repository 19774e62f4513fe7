use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Product, ProductColor};

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub colors: Vec<ProductColor>,
}
