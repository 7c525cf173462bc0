use crate::entities::{CouponStatus, coupon_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CouponResponse {
    pub id: i64,
    pub code: String,
    pub amount_cents: i64,
    pub status: CouponStatus,
    pub locked_order_id: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<coupon_entity::Model> for CouponResponse {
    fn from(m: coupon_entity::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            amount_cents: m.amount_cents,
            status: m.status,
            locked_order_id: m.locked_order_id,
            expires_at: m.expires_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssueCouponRequest {
    pub customer_id: i64,
    /// 面值（分），必须为正
    pub amount_cents: i64,
    /// 发放张数，上限见 shop.coupon_batch_max
    pub quantity: u32,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssueCouponResponse {
    pub issued: u32,
    pub requested: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CouponQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<CouponStatus>,
}
