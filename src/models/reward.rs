use crate::entities::{RewardStatus, reward_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RewardResponse {
    pub id: i64,
    pub prize_name: String,
    pub product_id: Option<i64>,
    pub variant_id: Option<i64>,
    pub unit_value_cents: i64,
    pub quantity: i32,
    pub status: RewardStatus,
    pub source_order_id: i64,
    pub consumed_order_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<reward_entity::Model> for RewardResponse {
    fn from(m: reward_entity::Model) -> Self {
        Self {
            id: m.id,
            prize_name: m.prize_name,
            product_id: m.product_id,
            variant_id: m.variant_id,
            unit_value_cents: m.unit_value_cents,
            quantity: m.quantity,
            status: m.status,
            source_order_id: m.source_order_id,
            consumed_order_id: m.consumed_order_id,
            created_at: m.created_at,
        }
    }
}

/// 抽奖中奖后写入奖品账本的奖品描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeDescriptor {
    pub product_id: Option<i64>,
    pub variant_id: Option<i64>,
    pub name: String,
    pub unit_value_cents: i64,
    pub quantity: i32,
}
