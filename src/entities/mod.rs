use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod auto_gifts;
pub mod cart_items;
pub mod coupons;
pub mod customers;
pub mod gift_threshold_items;
pub mod gift_thresholds;
pub mod lottery_draws;
pub mod lottery_group_items;
pub mod lottery_groups;
pub mod orders;
pub mod product_variants;
pub mod products;
pub mod rewards;

pub use auto_gifts as auto_gift_entity;
pub use cart_items as cart_item_entity;
pub use coupons as coupon_entity;
pub use customers as customer_entity;
pub use gift_threshold_items as gift_threshold_item_entity;
pub use gift_thresholds as gift_threshold_entity;
pub use lottery_draws as lottery_draw_entity;
pub use lottery_group_items as lottery_group_item_entity;
pub use lottery_groups as lottery_group_entity;
pub use orders as order_entity;
pub use product_variants as product_variant_entity;
pub use products as product_entity;
pub use rewards as reward_entity;

/// 订单支付状态机
/// pending -> processing（买家声称已付款）
/// pending/processing -> succeeded（确认收款，扣减库存，终态）
/// 任意 -> pending/failed（释放优惠券锁）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "succeeded")]
    Succeeded,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Processing => write!(f, "processing"),
            PaymentStatus::Succeeded => write!(f, "succeeded"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum CouponStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "revoked")]
    Revoked,
    #[sea_orm(string_value = "used")]
    Used,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum RewardStatus {
    #[sea_orm(string_value = "eligible")]
    Eligible,
    #[sea_orm(string_value = "consumed")]
    Consumed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}
