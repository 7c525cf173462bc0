use crate::config::ShopConfig;
use crate::database::DbPool;
use crate::entities::{CouponStatus, coupon_entity as coupons};
use crate::error::{AppError, AppResult};
use crate::models::{
    CouponQuery, CouponResponse, IssueCouponRequest, IssueCouponResponse, OwnerId,
    PaginatedResponse, PaginationParams,
};
use crate::services::pricing_service::CouponGrant;
use crate::utils::generate_six_digit_code;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

/// 优惠券账本：发放、校验、锁定/解锁、核销、作废。
/// 锁定与核销全部走条件更新（比较后置换），靠 rows_affected 判定胜负。
#[derive(Clone)]
pub struct CouponService {
    pool: DbPool,
    shop: ShopConfig,
}

impl CouponService {
    pub fn new(pool: DbPool, shop: ShopConfig) -> Self {
        Self { pool, shop }
    }

    /// 顾客侧分页列表
    pub async fn list_for_customer(
        &self,
        customer_id: i64,
        query: &CouponQuery,
    ) -> AppResult<PaginatedResponse<CouponResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base = coupons::Entity::find().filter(coupons::Column::CustomerId.eq(customer_id));
        if let Some(status) = query.status {
            base = base.filter(coupons::Column::Status.eq(status));
        }

        let total = base.clone().count(&self.pool).await? as i64;
        let items = base
            .order_by_desc(coupons::Column::CreatedAt)
            .paginate(&self.pool, params.get_limit() as u64)
            .fetch_page((params.get_page() - 1) as u64)
            .await?;

        let items: Vec<CouponResponse> = items.into_iter().map(Into::into).collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// 批量发放。单张插入失败只计入缺口，不中断整批。
    pub async fn issue(
        &self,
        owner: OwnerId,
        req: &IssueCouponRequest,
    ) -> AppResult<IssueCouponResponse> {
        if req.amount_cents <= 0 {
            return Err(AppError::ValidationError(
                "Coupon amount must be positive".to_string(),
            ));
        }
        if req.quantity == 0 || req.quantity > self.shop.coupon_batch_max {
            return Err(AppError::ValidationError(format!(
                "Quantity must be between 1 and {}",
                self.shop.coupon_batch_max
            )));
        }
        if let Some(exp) = req.expires_at
            && exp <= Utc::now()
        {
            return Err(AppError::ValidationError(
                "Expiration must be in the future".to_string(),
            ));
        }

        let mut issued = 0u32;
        for _ in 0..req.quantity {
            let am = coupons::ActiveModel {
                customer_id: Set(req.customer_id),
                code: Set(generate_six_digit_code()),
                amount_cents: Set(req.amount_cents),
                owner_id: Set(owner.to_column()),
                status: Set(CouponStatus::Active),
                expires_at: Set(req.expires_at),
                created_at: Set(Some(Utc::now())),
                ..Default::default()
            };
            match am.insert(&self.pool).await {
                Ok(_) => issued += 1,
                Err(e) => {
                    log::warn!("Coupon insert failed, continuing batch: {e}");
                }
            }
        }

        Ok(IssueCouponResponse {
            issued,
            requested: req.quantity,
        })
    }

    /// 满额档位在支付成功时兑现的批量发券
    pub async fn issue_grants<C: ConnectionTrait>(
        &self,
        conn: &C,
        customer_id: i64,
        owner: OwnerId,
        grants: &[CouponGrant],
    ) -> AppResult<u32> {
        let mut issued = 0u32;
        for grant in grants {
            for _ in 0..grant.times {
                let am = coupons::ActiveModel {
                    customer_id: Set(customer_id),
                    code: Set(generate_six_digit_code()),
                    amount_cents: Set(grant.amount_cents),
                    owner_id: Set(owner.to_column()),
                    status: Set(CouponStatus::Active),
                    expires_at: Set(None),
                    created_at: Set(Some(Utc::now())),
                    ..Default::default()
                };
                match am.insert(conn).await {
                    Ok(_) => issued += 1,
                    Err(e) => {
                        log::warn!("Threshold coupon insert failed, continuing: {e}");
                    }
                }
            }
        }
        Ok(issued)
    }

    /// 下单时的优惠券校验：归属、状态、锁、有效期都满足，
    /// 且小计必须严格大于券面值
    pub async fn validate_for_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        coupon_id: i64,
        customer_id: i64,
        owner: OwnerId,
        items_subtotal: i64,
    ) -> AppResult<coupons::Model> {
        let coupon = coupons::Entity::find_by_id(coupon_id)
            .filter(coupons::Column::CustomerId.eq(customer_id))
            .filter(owner.filter(coupons::Column::OwnerId))
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;

        if !coupon.is_usable(Utc::now()) {
            return Err(AppError::ValidationError(
                "Coupon is not usable".to_string(),
            ));
        }
        if !amount_deductible(items_subtotal, coupon.amount_cents) {
            return Err(AppError::ValidationError(
                "Order subtotal must exceed the coupon amount".to_string(),
            ));
        }
        Ok(coupon)
    }

    /// 加锁：仅当券仍为 active 且无人持锁时成功。
    /// 输掉竞争的一方拿到 false，调用方按“券不可用”降级处理。
    pub async fn lock<C: ConnectionTrait>(
        &self,
        conn: &C,
        coupon_id: i64,
        order_id: i64,
    ) -> AppResult<bool> {
        let res = coupons::Entity::update_many()
            .col_expr(
                coupons::Column::LockedOrderId,
                sea_orm::sea_query::Expr::value(order_id),
            )
            .col_expr(
                coupons::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(coupons::Column::Id.eq(coupon_id))
            .filter(coupons::Column::Status.eq(CouponStatus::Active))
            .filter(coupons::Column::LockedOrderId.is_null())
            .exec(conn)
            .await?;
        Ok(res.rows_affected == 1)
    }

    /// 解锁：仅持锁订单本人可解
    pub async fn unlock<C: ConnectionTrait>(
        &self,
        conn: &C,
        coupon_id: i64,
        order_id: i64,
    ) -> AppResult<bool> {
        let res = coupons::Entity::update_many()
            .col_expr(
                coupons::Column::LockedOrderId,
                sea_orm::sea_query::Expr::value(Option::<i64>::None),
            )
            .col_expr(
                coupons::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(coupons::Column::Id.eq(coupon_id))
            .filter(coupons::Column::LockedOrderId.eq(order_id))
            .exec(conn)
            .await?;
        Ok(res.rows_affected == 1)
    }

    /// 释放某订单持有的所有券锁（状态回退 / 订单删除 / 过期清理）
    pub async fn release_for_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: i64,
    ) -> AppResult<u64> {
        let res = coupons::Entity::update_many()
            .col_expr(
                coupons::Column::LockedOrderId,
                sea_orm::sea_query::Expr::value(Option::<i64>::None),
            )
            .col_expr(
                coupons::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(coupons::Column::LockedOrderId.eq(order_id))
            .filter(coupons::Column::Status.eq(CouponStatus::Active))
            .exec(conn)
            .await?;
        Ok(res.rows_affected)
    }

    /// 核销：支付成功时把持锁的券烧掉。locked_order_id 保留为核销订单。
    pub async fn finalize<C: ConnectionTrait>(
        &self,
        conn: &C,
        coupon_id: i64,
        order_id: i64,
    ) -> AppResult<bool> {
        let res = coupons::Entity::update_many()
            .col_expr(
                coupons::Column::Status,
                sea_orm::sea_query::Expr::value(CouponStatus::Used),
            )
            .col_expr(
                coupons::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(coupons::Column::Id.eq(coupon_id))
            .filter(coupons::Column::Status.eq(CouponStatus::Active))
            .filter(coupons::Column::LockedOrderId.eq(order_id))
            .exec(conn)
            .await?;
        Ok(res.rows_affected == 1)
    }

    /// 作废（管理侧）。被锁定的券不允许直接作废，避免抽走进行中订单的折扣。
    pub async fn revoke(&self, owner: OwnerId, coupon_id: i64) -> AppResult<()> {
        let res = coupons::Entity::update_many()
            .col_expr(
                coupons::Column::Status,
                sea_orm::sea_query::Expr::value(CouponStatus::Revoked),
            )
            .col_expr(
                coupons::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(coupons::Column::Id.eq(coupon_id))
            .filter(owner.filter(coupons::Column::OwnerId))
            .filter(coupons::Column::Status.eq(CouponStatus::Active))
            .filter(coupons::Column::LockedOrderId.is_null())
            .exec(&self.pool)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::Conflict(
                "Coupon is not active or currently locked".to_string(),
            ));
        }
        Ok(())
    }

    /// 物理删除，只允许删除已作废的券
    pub async fn delete(&self, owner: OwnerId, coupon_id: i64) -> AppResult<()> {
        let res = coupons::Entity::delete_many()
            .filter(coupons::Column::Id.eq(coupon_id))
            .filter(owner.filter(coupons::Column::OwnerId))
            .filter(coupons::Column::Status.eq(CouponStatus::Revoked))
            .exec(&self.pool)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::Conflict(
                "Only revoked coupons can be deleted".to_string(),
            ));
        }
        Ok(())
    }
}

/// 券面值必须严格小于商品小计：等额也拒绝，不允许抵成零元单
pub(crate) fn amount_deductible(items_subtotal: i64, amount_cents: i64) -> bool {
    items_subtotal > amount_cents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_deductible_boundary() {
        // 5.00 的券：小计 5.00 拒绝，5.01 通过
        assert!(!amount_deductible(500, 500));
        assert!(amount_deductible(501, 500));
    }

    #[test]
    fn test_amount_deductible_below_face_value() {
        assert!(!amount_deductible(499, 500));
    }
}
