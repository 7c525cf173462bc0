use crate::config::ShopConfig;
use crate::entities::{
    auto_gift_entity as auto_gifts, gift_threshold_entity as thresholds,
    gift_threshold_item_entity as threshold_items, product_entity as products,
};
use crate::error::AppResult;
use crate::models::{OrderLine, OwnerId};
use crate::services::CatalogService;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

/// 满额档位承诺的优惠券发放：仅在支付成功时才真正落券
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponGrant {
    pub amount_cents: i64,
    pub times: i64,
}

#[derive(Debug, Default)]
pub struct PricingOutcome {
    pub shipping_fee_cents: i64,
    pub gift_lines: Vec<OrderLine>,
    pub coupon_grants: Vec<CouponGrant>,
}

/// 定价与促销计算：输入（小计, owner 分区），输出配送费、赠品行、
/// 待发优惠券。本身不做任何写操作。
#[derive(Clone)]
pub struct PricingService {
    shop: ShopConfig,
    catalog: CatalogService,
}

/// 赠品候选的库存解析结果
struct GiftCandidate {
    product_id: i64,
    variant_id: Option<i64>,
    name: String,
    stock: i64,
}

impl PricingService {
    pub fn new(shop: ShopConfig, catalog: CatalogService) -> Self {
        Self { shop, catalog }
    }

    pub async fn price_promotions<C: ConnectionTrait>(
        &self,
        conn: &C,
        items_subtotal: i64,
        owner: OwnerId,
    ) -> AppResult<PricingOutcome> {
        let shipping_fee_cents = shipping_fee(
            items_subtotal,
            self.shop.flat_shipping_fee_cents,
            self.shop.free_shipping_threshold_cents,
        );

        let mut outcome = PricingOutcome {
            shipping_fee_cents,
            ..Default::default()
        };
        if items_subtotal <= 0 {
            return Ok(outcome);
        }

        // 满额档位按门槛升序逐档判定，各档独立计次
        let tiers = thresholds::Entity::find()
            .filter(owner.filter(thresholds::Column::OwnerId))
            .filter(thresholds::Column::IsActive.eq(true))
            .order_by_asc(thresholds::Column::ThresholdCents)
            .all(conn)
            .await?;

        for tier in tiers {
            let times = applicable_times(
                items_subtotal,
                tier.threshold_cents,
                tier.per_order_limit.map(|l| l as i64),
            );
            if times == 0 {
                continue;
            }

            if tier.give_coupon && tier.coupon_amount_cents > 0 {
                outcome.coupon_grants.push(CouponGrant {
                    amount_cents: tier.coupon_amount_cents,
                    times,
                });
            }

            if tier.give_products {
                let items = threshold_items::Entity::find()
                    .filter(threshold_items::Column::ThresholdId.eq(tier.id))
                    .all(conn)
                    .await?;
                let candidates = self
                    .resolve_candidates(
                        conn,
                        items.iter().map(|i| (i.product_id, i.variant_id)),
                    )
                    .await?;
                // 每档只选一个候选：剩余库存最多的那个，整档数量 = 命中次数
                if let Some(chosen) = pick_highest_stock(&candidates) {
                    outcome.gift_lines.push(OrderLine::AutoGift {
                        product_id: chosen.product_id,
                        variant_id: chosen.variant_id,
                        name: chosen.name.clone(),
                        quantity: times as i32,
                        stock_skipped: false,
                    });
                }
            }
        }

        // 常驻赠品池：与档位无关，选库存最多的一个
        let pool = auto_gifts::Entity::find()
            .filter(owner.filter(auto_gifts::Column::OwnerId))
            .filter(auto_gifts::Column::IsActive.eq(true))
            .all(conn)
            .await?;
        let candidates = self
            .resolve_candidates(conn, pool.iter().map(|g| (g.product_id, g.variant_id)))
            .await?;
        if let Some(chosen) = pick_highest_stock(&candidates) {
            outcome.gift_lines.push(OrderLine::AutoGift {
                product_id: chosen.product_id,
                variant_id: chosen.variant_id,
                name: chosen.name.clone(),
                quantity: 1,
                stock_skipped: false,
            });
        }

        Ok(outcome)
    }

    /// 逐个解析候选的当前库存；商品已消失的候选直接跳过
    async fn resolve_candidates<C: ConnectionTrait>(
        &self,
        conn: &C,
        refs: impl Iterator<Item = (i64, Option<i64>)>,
    ) -> AppResult<Vec<GiftCandidate>> {
        let mut out = Vec::new();
        for (product_id, variant_id) in refs {
            let Some(product) = products::Entity::find_by_id(product_id).one(conn).await? else {
                continue;
            };
            let variant = match variant_id {
                Some(vid) => self.catalog.get_variant(conn, vid).await?,
                None => None,
            };
            let stock = CatalogService::remaining_stock(&product, variant.as_ref());
            let name = match &variant {
                Some(v) => format!("{} {}", product.name, v.name),
                None => product.name.clone(),
            };
            out.push(GiftCandidate {
                product_id,
                variant_id,
                name,
                stock,
            });
        }
        Ok(out)
    }
}

/// 配送费：小计为 0 不收，达到免配送门槛不收，否则固定费
pub(crate) fn shipping_fee(subtotal: i64, flat_fee: i64, free_threshold: i64) -> i64 {
    if subtotal <= 0 || subtotal >= free_threshold {
        0
    } else {
        flat_fee
    }
}

/// applicable_times = min(floor(小计 / 门槛), 单笔上限)
pub(crate) fn applicable_times(subtotal: i64, threshold: i64, per_order_limit: Option<i64>) -> i64 {
    if threshold <= 0 || subtotal < threshold {
        return 0;
    }
    let times = subtotal / threshold;
    match per_order_limit {
        Some(limit) if limit >= 0 => times.min(limit),
        _ => times,
    }
}

fn pick_highest_stock(candidates: &[GiftCandidate]) -> Option<&GiftCandidate> {
    candidates
        .iter()
        .filter(|c| c.stock > 0)
        .max_by_key(|c| c.stock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_fee_below_threshold() {
        // 小计 9.00，免配送门槛 10.00 -> 收 1.00
        assert_eq!(shipping_fee(900, 100, 1000), 100);
    }

    #[test]
    fn test_shipping_fee_waived() {
        assert_eq!(shipping_fee(1000, 100, 1000), 0);
        assert_eq!(shipping_fee(2500, 100, 1000), 0);
    }

    #[test]
    fn test_shipping_fee_zero_subtotal() {
        assert_eq!(shipping_fee(0, 100, 1000), 0);
    }

    #[test]
    fn test_applicable_times_single_hit() {
        // 小计 25.00，门槛 20.00 -> 1 次
        assert_eq!(applicable_times(2500, 2000, None), 1);
    }

    #[test]
    fn test_applicable_times_repeat_and_cap() {
        assert_eq!(applicable_times(6500, 2000, None), 3);
        assert_eq!(applicable_times(6500, 2000, Some(2)), 2);
        assert_eq!(applicable_times(1999, 2000, None), 0);
    }

    #[test]
    fn test_applicable_times_bad_threshold() {
        assert_eq!(applicable_times(2500, 0, None), 0);
    }

    #[test]
    fn test_pick_highest_stock_requires_positive() {
        let mk = |id: i64, stock: i64| GiftCandidate {
            product_id: id,
            variant_id: None,
            name: format!("p{id}"),
            stock,
        };
        let cands = vec![mk(1, 0), mk(2, 5), mk(3, 9)];
        assert_eq!(pick_highest_stock(&cands).unwrap().product_id, 3);

        let all_empty = vec![mk(1, 0), mk(2, 0)];
        assert!(pick_highest_stock(&all_empty).is_none());
    }
}
