use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 满额赠送档位。applicable_times = min(小计 / threshold_cents, per_order_limit)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "gift_thresholds")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub owner_id: Option<i64>,
    pub threshold_cents: i64,
    /// 是否赠送商品（从 gift_threshold_items 候选中选库存最多的一个）
    pub give_products: bool,
    /// 是否在支付成功时发放优惠券
    pub give_coupon: bool,
    pub coupon_amount_cents: i64,
    /// NULL = 单笔订单不限次数
    pub per_order_limit: Option<i32>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
