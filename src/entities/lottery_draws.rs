use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 抽奖结果快照。order_id 唯一索引即幂等屏障：
/// 一行存在 = 该订单已经抽过，重查必须返回同一快照
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "lottery_draws")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub order_id: i64,
    pub prize_name: String,
    pub product_id: Option<i64>,
    pub variant_id: Option<i64>,
    pub unit_price_cents: i64,
    pub group_id: Option<i64>,
    pub is_win: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
