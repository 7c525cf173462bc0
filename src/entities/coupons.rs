use super::CouponStatus;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub customer_id: i64,
    pub code: String,
    pub amount_cents: i64,
    pub owner_id: Option<i64>,
    pub status: CouponStatus,
    /// 持锁订单；非空表示已被某个未完结订单占用
    pub locked_order_id: Option<i64>,
    /// NULL = 永不过期
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 可用 = active 且未被锁定且未过期
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == CouponStatus::Active
            && self.locked_order_id.is_none()
            && self.expires_at.is_none_or(|exp| exp > now)
    }
}
