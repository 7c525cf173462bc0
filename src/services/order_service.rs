use crate::config::ShopConfig;
use crate::database::DbPool;
use crate::entities::{
    PaymentStatus, cart_item_entity as cart_items, customer_entity as customers,
    lottery_draw_entity as draws, order_entity as orders, product_entity as products,
    product_variant_entity as variants,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AuthActor, CreateOrderRequest, CreateOrderResponse, OrderLine, OrderQuery, OrderResponse,
    OwnerId, OwnerScope, PaginatedResponse, PaginationParams, PrizeDescriptor, lines_from_json,
    lines_to_json,
};
use crate::services::catalog_service::effective_price_cents;
use crate::services::{CatalogService, CouponService, PricingService, RewardService, ScopeService};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::Expr,
};
use std::collections::HashMap;

/// 订单账本：下单、支付状态机、库存扣减/回补、过期清理。
/// 所有改账操作都在单个事务内完成，要么全部落库要么全部回滚。
#[derive(Clone)]
pub struct OrderService {
    pool: DbPool,
    shop: ShopConfig,
    catalog: CatalogService,
    scope: ScopeService,
    pricing: PricingService,
    coupons: CouponService,
    rewards: RewardService,
}

impl OrderService {
    pub fn new(
        pool: DbPool,
        shop: ShopConfig,
        catalog: CatalogService,
        scope: ScopeService,
        pricing: PricingService,
        coupons: CouponService,
        rewards: RewardService,
    ) -> Self {
        Self {
            pool,
            shop,
            catalog,
            scope,
            pricing,
            coupons,
            rewards,
        }
    }

    /// 下单:
    /// 1. 解析 owner 分区与配送地址（楼栋缺失直接拒绝）
    /// 2. 逐行解析商品：下架行静默丢弃，超库存行拒绝
    /// 3. 促销计算追加赠品行并定配送费
    /// 4. 满足门槛时核销顾客的可用奖品，零价行挂到本单
    /// 5. 落单后尝试锁券；输掉竞争降级为不使用折扣
    pub async fn create_order(
        &self,
        actor: &AuthActor,
        req: &CreateOrderRequest,
    ) -> AppResult<CreateOrderResponse> {
        let customer_id = actor.customer_id().ok_or(AppError::Forbidden)?;
        if req.items.is_empty() {
            return Err(AppError::ValidationError("Cart is empty".to_string()));
        }
        let scope = self
            .scope
            .resolve(actor, req.agent_id, req.address_id, req.building_id)
            .await?;

        let txn = self.pool.begin().await?;

        let mut lines: Vec<OrderLine> = Vec::with_capacity(req.items.len());
        let mut items_subtotal: i64 = 0;
        // 同一商品/规格可能拆成多行，库存校验按合计需求口径
        let mut demanded: HashMap<(i64, Option<i64>), i64> = HashMap::new();
        for item in &req.items {
            if item.quantity <= 0 {
                return Err(AppError::ValidationError(
                    "Quantity must be positive".to_string(),
                ));
            }
            let product = self
                .catalog
                .get_product(&txn, item.product_id, scope.owner)
                .await?
                .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
            if !product.is_active {
                // 下架商品不报错，直接从购物车里剔除
                continue;
            }
            let variant = match item.variant_id {
                Some(vid) => Some(self.catalog.get_variant_of(&txn, vid, product.id).await?),
                None => None,
            };
            let available = CatalogService::remaining_stock(&product, variant.as_ref());
            let needed = accumulate_demand(
                &mut demanded,
                product.id,
                item.variant_id,
                item.quantity as i64,
            );
            if needed > available {
                return Err(AppError::InsufficientStock { available });
            }

            let unit_price_cents = effective_price_cents(product.price_cents, product.discount);
            let subtotal_cents = unit_price_cents * item.quantity as i64;
            items_subtotal += subtotal_cents;
            let name = match &variant {
                Some(v) => format!("{} {}", product.name, v.name),
                None => product.name.clone(),
            };
            lines.push(OrderLine::Regular {
                product_id: product.id,
                variant_id: item.variant_id,
                name,
                unit_price_cents,
                quantity: item.quantity,
                subtotal_cents,
            });
        }
        if lines.is_empty() {
            return Err(AppError::ValidationError(
                "No purchasable items in cart".to_string(),
            ));
        }

        let promo = self
            .pricing
            .price_promotions(&txn, items_subtotal, scope.owner)
            .await?;
        lines.extend(promo.gift_lines.iter().cloned());

        // 先校验券（面值必须小于小计），锁要等拿到订单号再加
        let coupon = match req.coupon_id {
            Some(cid) => Some(
                self.coupons
                    .validate_for_order(&txn, cid, customer_id, scope.owner, items_subtotal)
                    .await?,
            ),
            None => None,
        };

        // 可核销奖品以零价行挂到本单
        let mut reward_ids: Vec<i64> = Vec::new();
        if items_subtotal >= self.shop.reward_qualify_cents {
            for reward in self
                .rewards
                .list_eligible(&txn, customer_id, scope.owner)
                .await?
            {
                lines.push(OrderLine::LotteryPrize {
                    product_id: reward.product_id,
                    variant_id: reward.variant_id,
                    name: reward.prize_name.clone(),
                    quantity: reward.quantity,
                    stock_skipped: false,
                });
                reward_ids.push(reward.id);
            }
        }

        let order = orders::ActiveModel {
            customer_id: Set(customer_id),
            payment_status: Set(PaymentStatus::Pending),
            items: Set(lines_to_json(&lines)?),
            total_cents: Set(compute_total(items_subtotal, 0, promo.shipping_fee_cents)),
            discount_cents: Set(0),
            coupon_id: Set(None),
            owner_id: Set(scope.owner.to_column()),
            address_id: Set(scope.address_id),
            building_id: Set(scope.building_id),
            remark: Set(req.remark.clone()),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 奖品核销绑定本单；影响行数不符会让整个事务回滚
        self.rewards
            .consume(&txn, customer_id, scope.owner, &reward_ids, order.id)
            .await?;

        let order = match &coupon {
            Some(c) if self.coupons.lock(&txn, c.id, order.id).await? => {
                let total_cents =
                    compute_total(items_subtotal, c.amount_cents, promo.shipping_fee_cents);
                let mut am = order.into_active_model();
                am.discount_cents = Set(c.amount_cents);
                am.coupon_id = Set(Some(c.id));
                am.total_cents = Set(total_cents);
                am.updated_at = Set(Some(Utc::now()));
                am.update(&txn).await?
            }
            Some(c) => {
                log::warn!(
                    "Lost the lock race for coupon {}, order {} placed without discount",
                    c.id,
                    order.id
                );
                order
            }
            None => order,
        };

        txn.commit().await?;

        // 地址快照回写顾客档案（尽力而为，失败不影响订单）
        if let Err(e) = self.snapshot_profile(customer_id, &scope).await {
            log::warn!("Failed to snapshot shipping profile for customer {customer_id}: {e}");
        }

        Ok(CreateOrderResponse {
            order_id: order.id,
            total_cents: order.total_cents,
            discount_cents: order.discount_cents,
            coupon_id: order.coupon_id,
        })
    }

    /// 支付状态机（见 entities::PaymentStatus 注释）。
    /// 进入 succeeded 时在同一事务内扣库存、烧券、转奖品、兑现发券；
    /// 回到 pending/failed 时释放券锁。
    pub async fn set_payment_status(
        &self,
        actor: &AuthActor,
        order_id: i64,
        new_status: PaymentStatus,
    ) -> AppResult<OrderResponse> {
        let txn = self.pool.begin().await?;
        let order = self.load_order_checked(&txn, actor, order_id).await?;

        if let AuthActor::Customer(_) = actor
            && new_status != PaymentStatus::Processing
        {
            // 顾客只能上报“我已付款”，收款确认是员工的事
            return Err(AppError::Forbidden);
        }

        if order.payment_status == new_status {
            // 重复请求按幂等处理，尤其是重放的 succeeded 不允许二次扣库存
            txn.commit().await?;
            return Ok(order.into());
        }
        if !transition_allowed(order.payment_status, new_status) {
            return Err(AppError::ValidationError(format!(
                "Invalid payment status transition: {} -> {}",
                order.payment_status, new_status
            )));
        }

        match new_status {
            PaymentStatus::Succeeded => {
                self.commit_stock(&txn, &order).await?;
            }
            PaymentStatus::Pending | PaymentStatus::Failed => {
                self.coupons.release_for_order(&txn, order.id).await?;
                // 券放回顾客手里的同时必须把折扣从订单上摘掉，
                // 否则订单后续仍能按折后价成交，同一张券优惠两次
                if order.coupon_id.is_some() {
                    orders::Entity::update_many()
                        .col_expr(orders::Column::CouponId, Expr::value(Option::<i64>::None))
                        .col_expr(orders::Column::DiscountCents, Expr::value(0i64))
                        .col_expr(
                            orders::Column::TotalCents,
                            Expr::value(order.total_cents + order.discount_cents),
                        )
                        .filter(orders::Column::Id.eq(order.id))
                        .exec(&txn)
                        .await?;
                }
            }
            PaymentStatus::Processing => {}
        }

        // 以旧状态为前提条件置换，并发竞争者会看到 0 行生效并整体回滚
        let res = orders::Entity::update_many()
            .col_expr(orders::Column::PaymentStatus, Expr::value(new_status))
            .col_expr(orders::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(orders::Column::Id.eq(order.id))
            .filter(orders::Column::PaymentStatus.eq(order.payment_status))
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::Conflict(
                "Order status changed concurrently".to_string(),
            ));
        }
        txn.commit().await?;

        let updated = orders::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        Ok(updated.into())
    }

    /// 收款确认时的库存扣减与促销结算。
    /// 常规行库存不足使整个状态迁移失败；赠品/抽奖行库存不足或
    /// 商品已消失只记日志跳过（促销成本自行吸收，不拦销售）。
    async fn commit_stock(&self, txn: &DatabaseTransaction, order: &orders::Model) -> AppResult<()> {
        let owner = OwnerId::from_column(order.owner_id);
        let mut lines = lines_from_json(&order.items);
        let mut any_skipped = false;

        for i in 0..lines.len() {
            let Some((product_id, variant_id, quantity)) = lines[i].stock_ref() else {
                continue;
            };
            let product = products::Entity::find_by_id(product_id).one(txn).await?;
            let Some(product) = product else {
                if lines[i].is_promotional() {
                    log::warn!(
                        "Order {}: promo line references vanished product {product_id}, skipped",
                        order.id
                    );
                    lines[i].mark_stock_skipped();
                    any_skipped = true;
                    continue;
                }
                return Err(AppError::NotFound(
                    "Product in order no longer exists".to_string(),
                ));
            };

            let affected = self
                .adjust_stock(txn, &product, variant_id, -(quantity as i64))
                .await?;
            if affected == 0 {
                if lines[i].is_promotional() {
                    log::warn!(
                        "Order {}: insufficient stock for promo line (product {product_id}), absorbed",
                        order.id
                    );
                    lines[i].mark_stock_skipped();
                    any_skipped = true;
                    continue;
                }
                let variant = match variant_id {
                    Some(vid) => self.catalog.get_variant(txn, vid).await?,
                    None => None,
                };
                let available = CatalogService::remaining_stock(&product, variant.as_ref());
                return Err(AppError::InsufficientStock { available });
            }
        }

        // 被放弃的促销行写回快照，删单回补库存时据此跳过
        if any_skipped {
            orders::Entity::update_many()
                .col_expr(orders::Column::Items, Expr::value(lines_to_json(&lines)?))
                .filter(orders::Column::Id.eq(order.id))
                .exec(txn)
                .await?;
        }

        // 成交副作用：清空购物车、烧券、抽奖结果转奖品、满额档位兑现发券
        cart_items::Entity::delete_many()
            .filter(cart_items::Column::CustomerId.eq(order.customer_id))
            .filter(owner.filter(cart_items::Column::OwnerId))
            .exec(txn)
            .await?;

        if let Some(coupon_id) = order.coupon_id
            && !self.coupons.finalize(txn, coupon_id, order.id).await?
        {
            // 锁已不在本单手里，按折后价成交等于这张券被用了两次
            return Err(AppError::Conflict(format!(
                "Coupon {coupon_id} is no longer locked by order {}",
                order.id
            )));
        }

        if let Some(draw) = draws::Entity::find()
            .filter(draws::Column::OrderId.eq(order.id))
            .one(txn)
            .await?
            && draw.is_win
        {
            let prize = PrizeDescriptor {
                product_id: draw.product_id,
                variant_id: draw.variant_id,
                name: draw.prize_name.clone(),
                unit_value_cents: draw.unit_price_cents,
                quantity: 1,
            };
            self.rewards
                .grant_from_order(txn, order.customer_id, owner, order.id, &prize)
                .await?;
        }

        let regular_subtotal: i64 = lines.iter().map(|l| l.subtotal_cents()).sum();
        let promo = self
            .pricing
            .price_promotions(txn, regular_subtotal, owner)
            .await?;
        self.coupons
            .issue_grants(txn, order.customer_id, owner, &promo.coupon_grants)
            .await?;

        Ok(())
    }

    /// commit_stock 的镜像：已收款订单被删除时回补库存，
    /// 跳过规则与扣减时一致
    async fn restore_stock(
        &self,
        txn: &DatabaseTransaction,
        order: &orders::Model,
    ) -> AppResult<()> {
        for line in &lines_from_json(&order.items) {
            let Some((product_id, variant_id, quantity)) = line.stock_ref() else {
                continue;
            };
            if !line.stock_committed() {
                // 收款时被放弃的促销行没扣过库存，补回去会凭空多出存货
                continue;
            }
            let Some(product) = products::Entity::find_by_id(product_id).one(txn).await? else {
                log::warn!(
                    "Order {}: product {product_id} vanished before restock, skipped",
                    order.id
                );
                continue;
            };
            self.adjust_stock(txn, &product, variant_id, quantity as i64)
                .await?;
        }
        Ok(())
    }

    /// 条件库存变更：规格有独立库存走规格，否则走主商品。
    /// 扣减以“剩余库存足够”为前提（条件更新），两个并发订单
    /// 抢最后一件时只有一单能成。
    async fn adjust_stock(
        &self,
        txn: &DatabaseTransaction,
        product: &products::Model,
        variant_id: Option<i64>,
        delta: i64,
    ) -> AppResult<u64> {
        let own_stock_variant = match variant_id {
            Some(vid) => self
                .catalog
                .get_variant(txn, vid)
                .await?
                .filter(|v| v.stock.is_some()),
            None => None,
        };

        let needed = (-delta).max(0);
        let res = if let Some(v) = own_stock_variant {
            variants::Entity::update_many()
                .col_expr(
                    variants::Column::Stock,
                    Expr::col(variants::Column::Stock).add(delta),
                )
                .filter(variants::Column::Id.eq(v.id))
                .filter(variants::Column::Stock.gte(needed))
                .exec(txn)
                .await?
        } else {
            products::Entity::update_many()
                .col_expr(
                    products::Column::Stock,
                    Expr::col(products::Column::Stock).add(delta),
                )
                .filter(products::Column::Id.eq(product.id))
                .filter(products::Column::Stock.gte(needed))
                .exec(txn)
                .await?
        };
        Ok(res.rows_affected)
    }

    /// 删除订单。已收款订单仅员工可删，删除前回补库存；
    /// 未收款订单释放券锁、把已核销奖品放回 eligible。
    /// 本单产生的未核销奖品随单作废。
    pub async fn delete_order(&self, actor: &AuthActor, order_id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let order = self.load_order_checked(&txn, actor, order_id).await?;

        if order.payment_status == PaymentStatus::Succeeded {
            if matches!(actor, AuthActor::Customer(_)) {
                return Err(AppError::Forbidden);
            }
            self.restore_stock(&txn, &order).await?;
        } else {
            self.coupons.release_for_order(&txn, order.id).await?;
            self.rewards
                .release_consumed_for_order(&txn, order.id)
                .await?;
        }
        self.rewards.cancel_for_source_order(&txn, order.id).await?;
        draws::Entity::delete_many()
            .filter(draws::Column::OrderId.eq(order.id))
            .exec(&txn)
            .await?;
        orders::Entity::delete_by_id(order.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// 清理超时未支付订单。引擎唯一的自主后台动作。
    pub async fn purge_expired_unpaid(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - Duration::minutes(self.shop.unpaid_order_expire_minutes);
        let stale = orders::Entity::find()
            .filter(
                orders::Column::PaymentStatus
                    .is_in([PaymentStatus::Pending, PaymentStatus::Failed]),
            )
            .filter(orders::Column::CreatedAt.lt(cutoff))
            .all(&self.pool)
            .await?;

        let mut purged = 0u64;
        for order in stale {
            let txn = self.pool.begin().await?;
            self.coupons.release_for_order(&txn, order.id).await?;
            self.rewards
                .release_consumed_for_order(&txn, order.id)
                .await?;
            self.rewards.cancel_for_source_order(&txn, order.id).await?;
            draws::Entity::delete_many()
                .filter(draws::Column::OrderId.eq(order.id))
                .exec(&txn)
                .await?;
            // 删除以“仍未支付”为前提，赶在清理前付款的订单放过
            let res = orders::Entity::delete_many()
                .filter(orders::Column::Id.eq(order.id))
                .filter(
                    orders::Column::PaymentStatus
                        .is_in([PaymentStatus::Pending, PaymentStatus::Failed]),
                )
                .exec(&txn)
                .await?;
            if res.rows_affected == 1 {
                txn.commit().await?;
                purged += 1;
            } else {
                txn.rollback().await?;
            }
        }
        Ok(purged)
    }

    pub async fn get_order(&self, actor: &AuthActor, order_id: i64) -> AppResult<OrderResponse> {
        let order = self.load_order_checked(&self.pool, actor, order_id).await?;
        Ok(order.into())
    }

    pub async fn list_orders(
        &self,
        actor: &AuthActor,
        query: &OrderQuery,
    ) -> AppResult<PaginatedResponse<OrderResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base = orders::Entity::find();
        match actor {
            AuthActor::Customer(id) => {
                base = base.filter(orders::Column::CustomerId.eq(*id));
            }
            AuthActor::Agent(id) => {
                base = base.filter(OwnerId::Agent(*id).filter(orders::Column::OwnerId));
            }
            AuthActor::Admin => {}
        }
        if let Some(status) = query.status {
            base = base.filter(orders::Column::PaymentStatus.eq(status));
        }

        let total = base.clone().count(&self.pool).await? as i64;
        let items = base
            .order_by_desc(orders::Column::CreatedAt)
            .paginate(&self.pool, params.get_limit() as u64)
            .fetch_page((params.get_page() - 1) as u64)
            .await?;

        let items: Vec<OrderResponse> = items.into_iter().map(Into::into).collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// 按身份加载订单：顾客只能看自己的，配送员只能看自己货架的，
    /// 不可见一律按不存在处理（不泄露跨租户存在性）
    async fn load_order_checked<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor: &AuthActor,
        order_id: i64,
    ) -> AppResult<orders::Model> {
        let mut q = orders::Entity::find_by_id(order_id);
        match actor {
            AuthActor::Customer(id) => {
                q = q.filter(orders::Column::CustomerId.eq(*id));
            }
            AuthActor::Agent(id) => {
                q = q.filter(OwnerId::Agent(*id).filter(orders::Column::OwnerId));
            }
            AuthActor::Admin => {}
        }
        q.one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
    }

    async fn snapshot_profile(&self, customer_id: i64, scope: &OwnerScope) -> AppResult<()> {
        customers::Entity::update_many()
            .col_expr(customers::Column::AddressId, Expr::value(scope.address_id))
            .col_expr(
                customers::Column::BuildingId,
                Expr::value(Some(scope.building_id)),
            )
            .col_expr(customers::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(customers::Column::Id.eq(customer_id))
            .exec(&self.pool)
            .await?;
        Ok(())
    }
}

/// 记录一行的库存需求并返回该商品/规格到目前为止的合计需求。
/// 拆成多行的同一商品必须按合计值与库存比较
fn accumulate_demand(
    demanded: &mut HashMap<(i64, Option<i64>), i64>,
    product_id: i64,
    variant_id: Option<i64>,
    quantity: i64,
) -> i64 {
    let total = demanded.entry((product_id, variant_id)).or_insert(0);
    *total += quantity;
    *total
}

/// total = max(0, 小计 - 折扣) + 配送费
pub(crate) fn compute_total(items_subtotal: i64, discount_cents: i64, shipping_fee_cents: i64) -> i64 {
    (items_subtotal - discount_cents).max(0) + shipping_fee_cents
}

/// 支付状态机的允许迁移（from != to 前提下）:
/// - pending/failed -> processing（买家报已付款）
/// - pending/processing -> succeeded（收款确认，终态）
/// - 未到 succeeded 的任意状态 <-> pending/failed
/// - succeeded 不可逆，只能通过删除 + 回补库存退出
pub(crate) fn transition_allowed(from: PaymentStatus, to: PaymentStatus) -> bool {
    use PaymentStatus::*;
    match (from, to) {
        (Succeeded, _) => false,
        (Pending | Failed, Processing) => true,
        (Pending | Processing, Succeeded) => true,
        (Processing | Failed, Pending) => true,
        (Pending | Processing, Failed) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_from_pending() {
        use PaymentStatus::*;
        assert!(transition_allowed(Pending, Processing));
        assert!(transition_allowed(Pending, Succeeded));
        assert!(transition_allowed(Pending, Failed));
    }

    #[test]
    fn test_succeeded_is_terminal() {
        use PaymentStatus::*;
        for to in [Pending, Processing, Failed] {
            assert!(!transition_allowed(Succeeded, to));
        }
    }

    #[test]
    fn test_processing_transitions() {
        use PaymentStatus::*;
        assert!(transition_allowed(Processing, Succeeded));
        assert!(transition_allowed(Processing, Failed));
        assert!(transition_allowed(Processing, Pending));
        assert!(transition_allowed(Failed, Processing));
        assert!(!transition_allowed(Failed, Succeeded));
    }

    #[test]
    fn test_compute_total_with_shipping() {
        // 小计 9.00 + 配送费 1.00 = 10.00
        assert_eq!(compute_total(900, 0, 100), 1000);
    }

    #[test]
    fn test_compute_total_never_negative() {
        assert_eq!(compute_total(501, 500, 0), 1);
        // 折扣超过小计时商品部分归零，只剩配送费
        assert_eq!(compute_total(400, 500, 100), 100);
    }

    #[test]
    fn test_discount_removal_restores_total() {
        // 券校验保证面值 < 小计，所以折后价加回面值恰好还原原价；
        // 释放券锁时就靠这条恒等式把订单金额摘回去
        let discounted = compute_total(2000, 500, 100);
        assert_eq!(discounted + 500, compute_total(2000, 0, 100));
    }

    #[test]
    fn test_demand_accumulates_across_duplicate_lines() {
        let mut demanded = HashMap::new();
        // 同一商品拆成两行 3 + 3，库存 5：第一行过，合计后第二行超
        assert_eq!(accumulate_demand(&mut demanded, 1, None, 3), 3);
        assert_eq!(accumulate_demand(&mut demanded, 1, None, 3), 6);
        // 不同规格各算各的
        assert_eq!(accumulate_demand(&mut demanded, 1, Some(7), 2), 2);
        assert_eq!(accumulate_demand(&mut demanded, 2, None, 4), 4);
    }
}
