use crate::config::ShopConfig;
use crate::database::DbPool;
use crate::entities::{
    lottery_draw_entity as draws, lottery_group_entity as groups,
    lottery_group_item_entity as group_items, order_entity as orders,
    product_entity as products,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AuthActor, CreateLotteryGroupRequest, DrawResponse, LotteryGroupResponse, OwnerId,
    UpdateLotteryGroupRequest, lines_from_json,
};
use crate::services::CatalogService;
use crate::services::catalog_service::effective_price_cents;
use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

const NO_WIN_PRIZE_NAME: &str = "谢谢参与";

/// 抽奖引擎：每单至多一次，两段加权抽取。
/// 订单维度的唯一索引是幂等屏障，重复请求拿回首次快照。
#[derive(Clone)]
pub struct LotteryService {
    pool: DbPool,
    shop: ShopConfig,
    catalog: CatalogService,
}

/// 第二段抽取的候选：奖品分组里某个商品及其当前剩余库存
struct PrizeCandidate {
    product_id: i64,
    variant_id: Option<i64>,
    name: String,
    unit_price_cents: i64,
    stock: i64,
}

impl LotteryService {
    pub fn new(pool: DbPool, shop: ShopConfig, catalog: CatalogService) -> Self {
        Self {
            pool,
            shop,
            catalog,
        }
    }

    /// 为订单抽一次奖:
    /// 1. 已有抽奖记录则原样返回（幂等）
    /// 2. 常规行小计未达门槛拒绝
    /// 3. 第一段按分组权重抽，权重合计之外的区间为未中奖
    /// 4. 第二段在中奖分组内按商品当前剩余库存加权抽；
    ///    全组零库存降级为未中奖
    /// 5. 结果（中奖或未中奖）先落库再返回
    pub async fn draw(&self, actor: &AuthActor, order_id: i64) -> AppResult<DrawResponse> {
        let customer_id = actor
            .customer_id()
            .ok_or(AppError::Forbidden)?;

        let order = orders::Entity::find_by_id(order_id)
            .filter(orders::Column::CustomerId.eq(customer_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if let Some(existing) = self.find_draw(order_id).await? {
            return Ok(DrawResponse::from_record(existing, true));
        }

        let regular_subtotal: i64 = lines_from_json(&order.items)
            .iter()
            .map(|l| l.subtotal_cents())
            .sum();
        if regular_subtotal < self.shop.lottery_qualify_cents {
            return Err(AppError::ValidationError(
                "Order not yet qualifying for a lottery draw".to_string(),
            ));
        }

        let owner = OwnerId::from_column(order.owner_id);

        let txn = self.pool.begin().await?;

        // 事务内复查，缩小与并发请求的窗口；真正的裁决在唯一索引
        if let Some(existing) = draws::Entity::find()
            .filter(draws::Column::OrderId.eq(order_id))
            .one(&txn)
            .await?
        {
            txn.commit().await?;
            return Ok(DrawResponse::from_record(existing, true));
        }

        let active_groups = self.load_active_groups(&txn, owner).await?;

        let weights: Vec<f64> = active_groups.iter().map(|(g, _)| g.weight).collect();
        let total: f64 = weights.iter().sum();
        let full = weight_scale(total).max(total);

        let group_roll = {
            let mut rng = rand::thread_rng();
            if full > 0.0 {
                rng.gen_range(0.0..full)
            } else {
                0.0
            }
        };

        let mut record = draws::ActiveModel {
            order_id: Set(order_id),
            prize_name: Set(NO_WIN_PRIZE_NAME.to_string()),
            product_id: Set(None),
            variant_id: Set(None),
            unit_price_cents: Set(0),
            group_id: Set(None),
            is_win: Set(false),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        };

        if !active_groups.is_empty()
            && let Some(idx) = pick_group(&weights, group_roll)
        {
            let (group, item_refs) = &active_groups[idx];
            let candidates = self.resolve_candidates(&txn, item_refs).await?;
            let stocks: Vec<i64> = candidates.iter().map(|c| c.stock).collect();
            let stock_total: i64 = stocks.iter().map(|s| (*s).max(0)).sum();

            let item_roll = {
                let mut rng = rand::thread_rng();
                if stock_total > 0 {
                    rng.gen_range(0..stock_total)
                } else {
                    0
                }
            };

            // 全组零库存：分组虽然被抽中，仍降级为未中奖
            if let Some(chosen) = pick_stock_weighted(&stocks, item_roll) {
                let c = &candidates[chosen];
                record.prize_name = Set(c.name.clone());
                record.product_id = Set(Some(c.product_id));
                record.variant_id = Set(c.variant_id);
                record.unit_price_cents = Set(c.unit_price_cents);
                record.group_id = Set(Some(group.id));
                record.is_win = Set(true);
            } else {
                record.group_id = Set(Some(group.id));
            }
        }

        match record.insert(&txn).await {
            Ok(saved) => {
                txn.commit().await?;
                Ok(DrawResponse::from_record(saved, false))
            }
            // 唯一索引裁决失败：并发请求先落了库，返回胜者的快照
            Err(insert_err) => {
                txn.rollback().await?;
                match self.find_draw(order_id).await? {
                    Some(existing) => Ok(DrawResponse::from_record(existing, true)),
                    None => Err(insert_err.into()),
                }
            }
        }
    }

    async fn find_draw(&self, order_id: i64) -> AppResult<Option<draws::Model>> {
        let found = draws::Entity::find()
            .filter(draws::Column::OrderId.eq(order_id))
            .one(&self.pool)
            .await?;
        Ok(found)
    }

    /// 启用且权重为正且至少挂了一个商品的分组
    async fn load_active_groups<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        owner: OwnerId,
    ) -> AppResult<Vec<(groups::Model, Vec<group_items::Model>)>> {
        let list = groups::Entity::find()
            .filter(owner.filter(groups::Column::OwnerId))
            .filter(groups::Column::IsActive.eq(true))
            .filter(groups::Column::Weight.gt(0.0))
            .order_by_asc(groups::Column::Id)
            .all(conn)
            .await?;

        let mut out = Vec::with_capacity(list.len());
        for group in list {
            let items = group_items::Entity::find()
                .filter(group_items::Column::GroupId.eq(group.id))
                .all(conn)
                .await?;
            if !items.is_empty() {
                out.push((group, items));
            }
        }
        Ok(out)
    }

    async fn resolve_candidates<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        items: &[group_items::Model],
    ) -> AppResult<Vec<PrizeCandidate>> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let Some(product) = products::Entity::find_by_id(item.product_id).one(conn).await?
            else {
                continue;
            };
            let variant = match item.variant_id {
                Some(vid) => self.catalog.get_variant(conn, vid).await?,
                None => None,
            };
            let stock = CatalogService::remaining_stock(&product, variant.as_ref());
            let name = match &variant {
                Some(v) => format!("{} {}", product.name, v.name),
                None => product.name.clone(),
            };
            out.push(PrizeCandidate {
                product_id: item.product_id,
                variant_id: item.variant_id,
                name,
                unit_price_cents: effective_price_cents(product.price_cents, product.discount),
                stock,
            });
        }
        Ok(out)
    }

    // -----------------------------
    // 奖品分组管理（管理侧）
    // -----------------------------

    pub async fn list_groups(&self, owner: OwnerId) -> AppResult<Vec<LotteryGroupResponse>> {
        let list = groups::Entity::find()
            .filter(owner.filter(groups::Column::OwnerId))
            .order_by_asc(groups::Column::Id)
            .all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(list.len());
        for group in list {
            let items = group_items::Entity::find()
                .filter(group_items::Column::GroupId.eq(group.id))
                .all(&self.pool)
                .await?;
            out.push(LotteryGroupResponse::from_model(group, items));
        }
        Ok(out)
    }

    pub async fn create_group(
        &self,
        owner: OwnerId,
        req: &CreateLotteryGroupRequest,
    ) -> AppResult<LotteryGroupResponse> {
        if !(req.weight >= 0.0) {
            return Err(AppError::ValidationError(
                "Weight must be non-negative".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;
        let group = groups::ActiveModel {
            owner_id: Set(owner.to_column()),
            name: Set(req.name.clone()),
            weight: Set(req.weight),
            is_active: Set(true),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(req.items.len());
        for item in &req.items {
            let saved = group_items::ActiveModel {
                group_id: Set(group.id),
                product_id: Set(item.product_id),
                variant_id: Set(item.variant_id),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            items.push(saved);
        }
        txn.commit().await?;

        Ok(LotteryGroupResponse::from_model(group, items))
    }

    pub async fn update_group(
        &self,
        owner: OwnerId,
        group_id: i64,
        req: &UpdateLotteryGroupRequest,
    ) -> AppResult<LotteryGroupResponse> {
        if let Some(w) = req.weight
            && !(w >= 0.0)
        {
            return Err(AppError::ValidationError(
                "Weight must be non-negative".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;
        let group = groups::Entity::find_by_id(group_id)
            .filter(owner.filter(groups::Column::OwnerId))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Lottery group not found".to_string()))?;

        let mut am = group.into_active_model();
        if let Some(name) = &req.name {
            am.name = Set(name.clone());
        }
        if let Some(w) = req.weight {
            am.weight = Set(w);
        }
        if let Some(active) = req.is_active {
            am.is_active = Set(active);
        }
        am.updated_at = Set(Some(Utc::now()));
        let group = am.update(&txn).await?;

        if let Some(new_items) = &req.items {
            group_items::Entity::delete_many()
                .filter(group_items::Column::GroupId.eq(group.id))
                .exec(&txn)
                .await?;
            for item in new_items {
                group_items::ActiveModel {
                    group_id: Set(group.id),
                    product_id: Set(item.product_id),
                    variant_id: Set(item.variant_id),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
        }

        let items = group_items::Entity::find()
            .filter(group_items::Column::GroupId.eq(group.id))
            .all(&txn)
            .await?;
        txn.commit().await?;

        Ok(LotteryGroupResponse::from_model(group, items))
    }

    pub async fn delete_group(&self, owner: OwnerId, group_id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let res = groups::Entity::delete_many()
            .filter(groups::Column::Id.eq(group_id))
            .filter(owner.filter(groups::Column::OwnerId))
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Lottery group not found".to_string()));
        }
        group_items::Entity::delete_many()
            .filter(group_items::Column::GroupId.eq(group_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(())
    }
}

/// 权重刻度：合计 <= 1 视为小数概率，否则视为百分比
pub(crate) fn weight_scale(total: f64) -> f64 {
    if total <= 1.0 { 1.0 } else { 100.0 }
}

/// 第一段：roll 落在某分组的累计权重区间内即中该组，
/// 超出合计权重的剩余区间为未中奖
pub(crate) fn pick_group(weights: &[f64], roll: f64) -> Option<usize> {
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if roll < acc {
            return Some(i);
        }
    }
    None
}

/// 第二段：按剩余库存加权（不是每件等概率）。
/// 库存合计为 0 返回 None。
pub(crate) fn pick_stock_weighted(stocks: &[i64], roll: i64) -> Option<usize> {
    let total: i64 = stocks.iter().filter(|s| **s > 0).sum();
    if total <= 0 {
        return None;
    }
    let mut acc = 0i64;
    for (i, s) in stocks.iter().enumerate() {
        if *s <= 0 {
            continue;
        }
        acc += s;
        if roll < acc {
            return Some(i);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_scale() {
        assert_eq!(weight_scale(0.5), 1.0);
        assert_eq!(weight_scale(1.0), 1.0);
        assert_eq!(weight_scale(50.0), 100.0);
    }

    #[test]
    fn test_pick_group_percentage_scale() {
        // 权重 [30, 20]，0-100 刻度：50 以上是未中奖区间
        let weights = [30.0, 20.0];
        assert_eq!(pick_group(&weights, 10.0), Some(0));
        assert_eq!(pick_group(&weights, 29.9), Some(0));
        assert_eq!(pick_group(&weights, 30.0), Some(1));
        assert_eq!(pick_group(&weights, 49.9), Some(1));
        assert_eq!(pick_group(&weights, 50.0), None);
        assert_eq!(pick_group(&weights, 99.0), None);
    }

    #[test]
    fn test_pick_group_fraction_scale() {
        let weights = [0.3, 0.2];
        assert_eq!(pick_group(&weights, 0.1), Some(0));
        assert_eq!(pick_group(&weights, 0.35), Some(1));
        assert_eq!(pick_group(&weights, 0.6), None);
    }

    #[test]
    fn test_pick_stock_weighted() {
        let stocks = [3, 0, 2];
        assert_eq!(pick_stock_weighted(&stocks, 0), Some(0));
        assert_eq!(pick_stock_weighted(&stocks, 2), Some(0));
        assert_eq!(pick_stock_weighted(&stocks, 3), Some(2));
        assert_eq!(pick_stock_weighted(&stocks, 4), Some(2));
    }

    #[test]
    fn test_pick_stock_weighted_all_empty() {
        // 中奖分组里全部商品零库存 -> 未中奖，绝不产生负库存分配
        assert_eq!(pick_stock_weighted(&[0, 0], 0), None);
        assert_eq!(pick_stock_weighted(&[], 0), None);
    }
}
