use crate::entities::{PaymentStatus, order_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 订单行项目。三种形态共用一个带标签的联合体，
/// 赠品与抽奖行不携带金额字段（单价恒为 0）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderLine {
    Regular {
        product_id: i64,
        variant_id: Option<i64>,
        name: String,
        unit_price_cents: i64,
        quantity: i32,
        subtotal_cents: i64,
    },
    AutoGift {
        product_id: i64,
        variant_id: Option<i64>,
        name: String,
        quantity: i32,
        /// 收款时因库存不足被放弃，未扣过库存
        #[serde(default)]
        stock_skipped: bool,
    },
    LotteryPrize {
        product_id: Option<i64>,
        variant_id: Option<i64>,
        name: String,
        quantity: i32,
        #[serde(default)]
        stock_skipped: bool,
    },
}

impl OrderLine {
    /// 赠品 / 抽奖行（库存不足时跳过而不是阻塞支付）
    pub fn is_promotional(&self) -> bool {
        !matches!(self, OrderLine::Regular { .. })
    }

    /// 库存变动引用：(product_id, variant_id, quantity)。
    /// 抽奖行的商品可能已经下架，此时返回 None（虚拟商品，不动库存）
    pub fn stock_ref(&self) -> Option<(i64, Option<i64>, i32)> {
        match self {
            OrderLine::Regular {
                product_id,
                variant_id,
                quantity,
                ..
            } => Some((*product_id, *variant_id, *quantity)),
            OrderLine::AutoGift {
                product_id,
                variant_id,
                quantity,
                ..
            } => Some((*product_id, *variant_id, *quantity)),
            OrderLine::LotteryPrize {
                product_id,
                variant_id,
                quantity,
                ..
            } => product_id.map(|pid| (pid, *variant_id, *quantity)),
        }
    }

    /// 该行是否真的扣过库存。被放弃的促销行回补时必须跳过，
    /// 否则会补回从未扣减的数量
    pub fn stock_committed(&self) -> bool {
        match self {
            OrderLine::Regular { .. } => true,
            OrderLine::AutoGift { stock_skipped, .. }
            | OrderLine::LotteryPrize { stock_skipped, .. } => !stock_skipped,
        }
    }

    pub fn mark_stock_skipped(&mut self) {
        match self {
            OrderLine::Regular { .. } => {}
            OrderLine::AutoGift { stock_skipped, .. }
            | OrderLine::LotteryPrize { stock_skipped, .. } => *stock_skipped = true,
        }
    }

    pub fn subtotal_cents(&self) -> i64 {
        match self {
            OrderLine::Regular { subtotal_cents, .. } => *subtotal_cents,
            _ => 0,
        }
    }
}

/// 行项目快照与 JSON 列之间的转换
pub fn lines_to_json(lines: &[OrderLine]) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(lines)
}

pub fn lines_from_json(value: &serde_json::Value) -> Vec<OrderLine> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLineRequest {
    pub product_id: i64,
    pub variant_id: Option<i64>,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<CartLineRequest>,
    /// 下单的货架：不传 = 平台共享货架，传 = 指定配送员自营货架
    pub agent_id: Option<i64>,
    pub coupon_id: Option<i64>,
    /// 不传则使用顾客档案里缓存的默认地址
    pub address_id: Option<i64>,
    pub building_id: Option<i64>,
    pub remark: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderResponse {
    pub order_id: i64,
    pub total_cents: i64,
    pub discount_cents: i64,
    /// 锁券失败会降级为不使用优惠券，此时为 null
    pub coupon_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetPaymentStatusRequest {
    pub status: PaymentStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<PaymentStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderLine>,
    pub total_cents: i64,
    pub discount_cents: i64,
    pub coupon_id: Option<i64>,
    pub building_id: i64,
    pub remark: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<order_entity::Model> for OrderResponse {
    fn from(m: order_entity::Model) -> Self {
        Self {
            id: m.id,
            payment_status: m.payment_status,
            items: lines_from_json(&m.items),
            total_cents: m.total_cents,
            discount_cents: m.discount_cents,
            coupon_id: m.coupon_id,
            building_id: m.building_id,
            remark: m.remark,
            created_at: m.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_line_tagged_serde() {
        let lines = vec![
            OrderLine::Regular {
                product_id: 1,
                variant_id: None,
                name: "矿泉水".to_string(),
                unit_price_cents: 200,
                quantity: 3,
                subtotal_cents: 600,
            },
            OrderLine::AutoGift {
                product_id: 2,
                variant_id: Some(9),
                name: "赠品辣条".to_string(),
                quantity: 1,
                stock_skipped: false,
            },
            OrderLine::LotteryPrize {
                product_id: None,
                variant_id: None,
                name: "神秘奖品".to_string(),
                quantity: 1,
                stock_skipped: false,
            },
        ];

        let json = lines_to_json(&lines).unwrap();
        assert_eq!(json[0]["kind"], "regular");
        assert_eq!(json[1]["kind"], "auto_gift");
        assert_eq!(json[2]["kind"], "lottery_prize");

        let back = lines_from_json(&json);
        assert_eq!(back, lines);
    }

    #[test]
    fn test_stock_ref_virtual_prize() {
        let virtual_prize = OrderLine::LotteryPrize {
            product_id: None,
            variant_id: None,
            name: "已下架奖品".to_string(),
            quantity: 1,
            stock_skipped: false,
        };
        assert_eq!(virtual_prize.stock_ref(), None);

        let gift = OrderLine::AutoGift {
            product_id: 5,
            variant_id: None,
            name: "赠品".to_string(),
            quantity: 2,
            stock_skipped: false,
        };
        assert_eq!(gift.stock_ref(), Some((5, None, 2)));
        assert!(gift.is_promotional());
    }

    #[test]
    fn test_skipped_promo_line_survives_snapshot() {
        let mut gift = OrderLine::AutoGift {
            product_id: 5,
            variant_id: None,
            name: "赠品".to_string(),
            quantity: 2,
            stock_skipped: false,
        };
        assert!(gift.stock_committed());

        // 收款时库存不足被放弃，标记必须随快照落库并在回补时生效
        gift.mark_stock_skipped();
        let json = lines_to_json(std::slice::from_ref(&gift)).unwrap();
        let back = lines_from_json(&json);
        assert!(!back[0].stock_committed());

        // 常规行永远算扣过库存
        let mut regular = OrderLine::Regular {
            product_id: 1,
            variant_id: None,
            name: "矿泉水".to_string(),
            unit_price_cents: 200,
            quantity: 1,
            subtotal_cents: 200,
        };
        regular.mark_stock_skipped();
        assert!(regular.stock_committed());
    }

    #[test]
    fn test_old_snapshot_without_skip_flag() {
        // 旧快照里没有 stock_skipped 字段，按扣过库存处理
        let json = serde_json::json!([
            {"kind": "auto_gift", "product_id": 7, "variant_id": null, "name": "赠品", "quantity": 1}
        ]);
        let lines = lines_from_json(&json);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].stock_committed());
    }

    #[test]
    fn test_lines_from_malformed_json() {
        let bad = serde_json::json!({"not": "an array"});
        assert!(lines_from_json(&bad).is_empty());
    }
}
