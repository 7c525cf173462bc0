use crate::database::DbPool;
use crate::entities::{RewardStatus, reward_entity as rewards};
use crate::error::{AppError, AppResult};
use crate::models::{OwnerId, PaginatedResponse, PaginationParams, PrizeDescriptor, RewardResponse};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

/// 奖品账本：抽奖产出的奖品挂在顾客账上，由后续满足门槛的
/// 订单一次性核销。source_order_id 唯一索引保证一单最多一个奖品。
#[derive(Clone)]
pub struct RewardService {
    pool: DbPool,
}

impl RewardService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// 由中奖订单生成奖品。该订单已有奖品时为幂等空操作。
    pub async fn grant_from_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        customer_id: i64,
        owner: OwnerId,
        source_order_id: i64,
        prize: &PrizeDescriptor,
    ) -> AppResult<bool> {
        let existing = rewards::Entity::find()
            .filter(rewards::Column::SourceOrderId.eq(source_order_id))
            .one(conn)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        let am = rewards::ActiveModel {
            customer_id: Set(customer_id),
            owner_id: Set(owner.to_column()),
            product_id: Set(prize.product_id),
            variant_id: Set(prize.variant_id),
            prize_name: Set(prize.name.clone()),
            unit_value_cents: Set(prize.unit_value_cents),
            quantity: Set(prize.quantity),
            status: Set(RewardStatus::Eligible),
            source_order_id: Set(source_order_id),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        match am.insert(conn).await {
            Ok(_) => Ok(true),
            // 并发重试撞上唯一索引：胜者已写入，视同空操作
            Err(e) => {
                let already = rewards::Entity::find()
                    .filter(rewards::Column::SourceOrderId.eq(source_order_id))
                    .one(conn)
                    .await?;
                if already.is_some() {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// 顾客当前可核销的奖品
    pub async fn list_eligible<C: ConnectionTrait>(
        &self,
        conn: &C,
        customer_id: i64,
        owner: OwnerId,
    ) -> AppResult<Vec<rewards::Model>> {
        let list = rewards::Entity::find()
            .filter(rewards::Column::CustomerId.eq(customer_id))
            .filter(owner.filter(rewards::Column::OwnerId))
            .filter(rewards::Column::Status.eq(RewardStatus::Eligible))
            .order_by_asc(rewards::Column::Id)
            .all(conn)
            .await?;
        Ok(list)
    }

    /// 批量核销 eligible -> consumed，绑定核销订单。
    /// 影响行数必须等于请求行数，否则说明调用方拿到了过期快照。
    pub async fn consume<C: ConnectionTrait>(
        &self,
        conn: &C,
        customer_id: i64,
        owner: OwnerId,
        reward_ids: &[i64],
        consuming_order_id: i64,
    ) -> AppResult<()> {
        if reward_ids.is_empty() {
            return Ok(());
        }
        let res = rewards::Entity::update_many()
            .col_expr(
                rewards::Column::Status,
                sea_orm::sea_query::Expr::value(RewardStatus::Consumed),
            )
            .col_expr(
                rewards::Column::ConsumedOrderId,
                sea_orm::sea_query::Expr::value(consuming_order_id),
            )
            .col_expr(
                rewards::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(rewards::Column::Id.is_in(reward_ids.iter().copied()))
            .filter(rewards::Column::CustomerId.eq(customer_id))
            .filter(owner.filter(rewards::Column::OwnerId))
            .filter(rewards::Column::Status.eq(RewardStatus::Eligible))
            .exec(conn)
            .await?;
        if res.rows_affected != reward_ids.len() as u64 {
            return Err(AppError::Conflict(format!(
                "Expected to consume {} rewards, affected {}",
                reward_ids.len(),
                res.rows_affected
            )));
        }
        Ok(())
    }

    /// 来源订单消失时作废尚未核销的奖品
    pub async fn cancel_for_source_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        source_order_id: i64,
    ) -> AppResult<bool> {
        let res = rewards::Entity::update_many()
            .col_expr(
                rewards::Column::Status,
                sea_orm::sea_query::Expr::value(RewardStatus::Cancelled),
            )
            .col_expr(
                rewards::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(rewards::Column::SourceOrderId.eq(source_order_id))
            .filter(rewards::Column::Status.eq(RewardStatus::Eligible))
            .exec(conn)
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// 核销订单未支付就被删除时，把奖品放回 eligible
    pub async fn release_consumed_for_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        consuming_order_id: i64,
    ) -> AppResult<u64> {
        let res = rewards::Entity::update_many()
            .col_expr(
                rewards::Column::Status,
                sea_orm::sea_query::Expr::value(RewardStatus::Eligible),
            )
            .col_expr(
                rewards::Column::ConsumedOrderId,
                sea_orm::sea_query::Expr::value(Option::<i64>::None),
            )
            .col_expr(
                rewards::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(rewards::Column::ConsumedOrderId.eq(consuming_order_id))
            .filter(rewards::Column::Status.eq(RewardStatus::Consumed))
            .exec(conn)
            .await?;
        Ok(res.rows_affected)
    }

    /// 顾客侧分页列表（含历史）
    pub async fn list_for_customer(
        &self,
        customer_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<RewardResponse>> {
        let base = rewards::Entity::find().filter(rewards::Column::CustomerId.eq(customer_id));

        let total = base.clone().count(&self.pool).await? as i64;
        let items = base
            .order_by_desc(rewards::Column::Id)
            .paginate(&self.pool, params.get_limit() as u64)
            .fetch_page((params.get_page() - 1) as u64)
            .await?;

        let items: Vec<RewardResponse> = items.into_iter().map(Into::into).collect();
        Ok(PaginatedResponse::new(items, params, total))
    }
}
