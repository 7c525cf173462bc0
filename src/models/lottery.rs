use crate::entities::{lottery_draw_entity, lottery_group_entity, lottery_group_item_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 抽奖结果。重复请求返回首次落库的同一快照，already_drawn = true
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DrawResponse {
    pub order_id: i64,
    pub is_win: bool,
    pub prize_name: String,
    pub product_id: Option<i64>,
    pub variant_id: Option<i64>,
    pub unit_price_cents: i64,
    pub already_drawn: bool,
    pub drawn_at: Option<DateTime<Utc>>,
}

impl DrawResponse {
    pub fn from_record(m: lottery_draw_entity::Model, already_drawn: bool) -> Self {
        Self {
            order_id: m.order_id,
            is_win: m.is_win,
            prize_name: m.prize_name,
            product_id: m.product_id,
            variant_id: m.variant_id,
            unit_price_cents: m.unit_price_cents,
            already_drawn,
            drawn_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LotteryGroupItemRequest {
    pub product_id: i64,
    pub variant_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateLotteryGroupRequest {
    pub name: String,
    /// 权重，非负；全部分组合计 <= 1 按小数概率解释，否则按百分比
    pub weight: f64,
    #[serde(default)]
    pub items: Vec<LotteryGroupItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateLotteryGroupRequest {
    pub name: Option<String>,
    pub weight: Option<f64>,
    pub is_active: Option<bool>,
    /// 传入则整体替换候选商品列表
    pub items: Option<Vec<LotteryGroupItemRequest>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LotteryGroupItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub variant_id: Option<i64>,
}

impl From<lottery_group_item_entity::Model> for LotteryGroupItemResponse {
    fn from(m: lottery_group_item_entity::Model) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            variant_id: m.variant_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LotteryGroupResponse {
    pub id: i64,
    pub name: String,
    pub weight: f64,
    pub is_active: bool,
    pub items: Vec<LotteryGroupItemResponse>,
}

impl LotteryGroupResponse {
    pub fn from_model(
        m: lottery_group_entity::Model,
        items: Vec<lottery_group_item_entity::Model>,
    ) -> Self {
        Self {
            id: m.id,
            name: m.name,
            weight: m.weight,
            is_active: m.is_active,
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}
