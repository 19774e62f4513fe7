use sea_orm::entity::prelude::*;

use crate::pricing::DiscountType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount: i64,
    pub max_discount: Option<i64>,
    pub min_order: i64,
    pub end_date: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::used_coupons::Entity")]
    UsedCoupons,
    #[sea_orm(has_many = "super::order_coupons::Entity")]
    OrderCoupons,
}

impl Related<super::used_coupons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsedCoupons.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
