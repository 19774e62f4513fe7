pub mod cart_items;
pub mod coupons;
pub mod order_coupons;
pub mod order_products;
pub mod orders;
pub mod payment_methods;
pub mod payments;
pub mod product_colors;
pub mod products;
pub mod shippings;
pub mod used_coupons;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use coupons::Entity as Coupons;
pub use order_coupons::Entity as OrderCoupons;
pub use order_products::Entity as OrderProducts;
pub use orders::Entity as Orders;
pub use payment_methods::Entity as PaymentMethods;
pub use payments::Entity as Payments;
pub use product_colors::Entity as ProductColors;
pub use products::Entity as Products;
pub use shippings::Entity as Shippings;
pub use used_coupons::Entity as UsedCoupons;
pub use users::Entity as Users;

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, EntityTrait, QueryTrait, Related};

    use super::*;

    fn join_sql<E, R>(related: R) -> String
    where
        E: EntityTrait + Related<R>,
        R: EntityTrait,
    {
        E::find()
            .find_also_related(related)
            .build(DbBackend::Postgres)
            .to_string()
    }

    // The order queries walk these pairs from the child side, so each
    // relation has to resolve in both directions.
    #[test]
    fn relations_resolve_from_the_child_side() {
        assert!(join_sql::<CartItems, _>(Users).contains("JOIN \"users\""));
        assert!(join_sql::<UsedCoupons, _>(Coupons).contains("JOIN \"coupons\""));
        assert!(join_sql::<UsedCoupons, _>(Users).contains("JOIN \"users\""));
        assert!(join_sql::<OrderCoupons, _>(Coupons).contains("JOIN \"coupons\""));
        assert!(join_sql::<Payments, _>(PaymentMethods).contains("JOIN \"payment_methods\""));
        assert!(join_sql::<Orders, _>(Shippings).contains("JOIN \"shippings\""));
        assert!(join_sql::<Orders, _>(Payments).contains("JOIN \"payments\""));
        assert!(join_sql::<OrderProducts, _>(Products).contains("JOIN \"products\""));
    }
}
