use crate::entities::{auto_gift_entity, gift_threshold_entity, gift_threshold_item_entity};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GiftThresholdItemRequest {
    pub product_id: i64,
    pub variant_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateGiftThresholdRequest {
    /// 满额门槛（分），必须为正
    pub threshold_cents: i64,
    #[serde(default)]
    pub give_products: bool,
    #[serde(default)]
    pub give_coupon: bool,
    /// give_coupon = true 时必须为正
    #[serde(default)]
    pub coupon_amount_cents: i64,
    pub per_order_limit: Option<i32>,
    #[serde(default)]
    pub items: Vec<GiftThresholdItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateGiftThresholdRequest {
    pub threshold_cents: Option<i64>,
    pub give_products: Option<bool>,
    pub give_coupon: Option<bool>,
    pub coupon_amount_cents: Option<i64>,
    pub per_order_limit: Option<i32>,
    pub is_active: Option<bool>,
    /// 传入则整体替换候选商品列表
    pub items: Option<Vec<GiftThresholdItemRequest>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GiftThresholdItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub variant_id: Option<i64>,
}

impl From<gift_threshold_item_entity::Model> for GiftThresholdItemResponse {
    fn from(m: gift_threshold_item_entity::Model) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            variant_id: m.variant_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GiftThresholdResponse {
    pub id: i64,
    pub threshold_cents: i64,
    pub give_products: bool,
    pub give_coupon: bool,
    pub coupon_amount_cents: i64,
    pub per_order_limit: Option<i32>,
    pub is_active: bool,
    pub items: Vec<GiftThresholdItemResponse>,
}

impl GiftThresholdResponse {
    pub fn from_model(
        m: gift_threshold_entity::Model,
        items: Vec<gift_threshold_item_entity::Model>,
    ) -> Self {
        Self {
            id: m.id,
            threshold_cents: m.threshold_cents,
            give_products: m.give_products,
            give_coupon: m.give_coupon,
            coupon_amount_cents: m.coupon_amount_cents,
            per_order_limit: m.per_order_limit,
            is_active: m.is_active,
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateAutoGiftRequest {
    pub product_id: i64,
    pub variant_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateAutoGiftRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AutoGiftResponse {
    pub id: i64,
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub is_active: bool,
}

impl From<auto_gift_entity::Model> for AutoGiftResponse {
    fn from(m: auto_gift_entity::Model) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            variant_id: m.variant_id,
            is_active: m.is_active,
        }
    }
}
