use super::PaymentStatus;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub customer_id: i64,
    pub payment_status: PaymentStatus,
    /// 行项目快照（见 models::order::OrderLine），持久化后只允许
    /// 在支付确认前追加赠品/抽奖行
    pub items: Json,
    pub total_cents: i64,
    pub discount_cents: i64,
    pub coupon_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub address_id: Option<i64>,
    pub building_id: i64,
    pub remark: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
