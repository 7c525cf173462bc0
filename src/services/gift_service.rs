use crate::database::DbPool;
use crate::entities::{
    auto_gift_entity as auto_gifts, gift_threshold_entity as thresholds,
    gift_threshold_item_entity as threshold_items,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AutoGiftResponse, CreateAutoGiftRequest, CreateGiftThresholdRequest, GiftThresholdItemRequest,
    GiftThresholdResponse, OwnerId, UpdateGiftThresholdRequest,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

/// 满额赠送档位与常驻赠品池的员工侧维护。
/// 促销本身的执行在 PricingService。
#[derive(Clone)]
pub struct GiftService {
    pool: DbPool,
}

impl GiftService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_thresholds(&self, owner: OwnerId) -> AppResult<Vec<GiftThresholdResponse>> {
        let tiers = thresholds::Entity::find()
            .filter(owner.filter(thresholds::Column::OwnerId))
            .order_by_asc(thresholds::Column::ThresholdCents)
            .all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(tiers.len());
        for tier in tiers {
            let items = threshold_items::Entity::find()
                .filter(threshold_items::Column::ThresholdId.eq(tier.id))
                .all(&self.pool)
                .await?;
            out.push(GiftThresholdResponse::from_model(tier, items));
        }
        Ok(out)
    }

    pub async fn create_threshold(
        &self,
        owner: OwnerId,
        req: &CreateGiftThresholdRequest,
    ) -> AppResult<GiftThresholdResponse> {
        validate_tier(req.threshold_cents, req.give_coupon, req.coupon_amount_cents)?;
        if let Some(limit) = req.per_order_limit
            && limit <= 0
        {
            return Err(AppError::ValidationError(
                "Per-order limit must be positive".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;
        let tier = thresholds::ActiveModel {
            owner_id: Set(owner.to_column()),
            threshold_cents: Set(req.threshold_cents),
            give_products: Set(req.give_products),
            give_coupon: Set(req.give_coupon),
            coupon_amount_cents: Set(req.coupon_amount_cents),
            per_order_limit: Set(req.per_order_limit),
            is_active: Set(true),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        let items = self.replace_items(&txn, tier.id, &req.items).await?;
        txn.commit().await?;

        Ok(GiftThresholdResponse::from_model(tier, items))
    }

    pub async fn update_threshold(
        &self,
        owner: OwnerId,
        tier_id: i64,
        req: &UpdateGiftThresholdRequest,
    ) -> AppResult<GiftThresholdResponse> {
        let txn = self.pool.begin().await?;
        let tier = thresholds::Entity::find_by_id(tier_id)
            .filter(owner.filter(thresholds::Column::OwnerId))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Gift threshold not found".to_string()))?;

        let threshold_cents = req.threshold_cents.unwrap_or(tier.threshold_cents);
        let give_coupon = req.give_coupon.unwrap_or(tier.give_coupon);
        let coupon_amount_cents = req.coupon_amount_cents.unwrap_or(tier.coupon_amount_cents);
        validate_tier(threshold_cents, give_coupon, coupon_amount_cents)?;

        let mut am = tier.clone().into_active_model();
        am.threshold_cents = Set(threshold_cents);
        am.give_coupon = Set(give_coupon);
        am.coupon_amount_cents = Set(coupon_amount_cents);
        if let Some(v) = req.give_products {
            am.give_products = Set(v);
        }
        if let Some(v) = req.per_order_limit {
            if v <= 0 {
                return Err(AppError::ValidationError(
                    "Per-order limit must be positive".to_string(),
                ));
            }
            am.per_order_limit = Set(Some(v));
        }
        if let Some(v) = req.is_active {
            am.is_active = Set(v);
        }
        am.updated_at = Set(Some(Utc::now()));
        let tier = am.update(&txn).await?;

        let items = match &req.items {
            Some(items) => self.replace_items(&txn, tier.id, items).await?,
            None => {
                threshold_items::Entity::find()
                    .filter(threshold_items::Column::ThresholdId.eq(tier.id))
                    .all(&txn)
                    .await?
            }
        };
        txn.commit().await?;

        Ok(GiftThresholdResponse::from_model(tier, items))
    }

    pub async fn delete_threshold(&self, owner: OwnerId, tier_id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let tier = thresholds::Entity::find_by_id(tier_id)
            .filter(owner.filter(thresholds::Column::OwnerId))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Gift threshold not found".to_string()))?;
        threshold_items::Entity::delete_many()
            .filter(threshold_items::Column::ThresholdId.eq(tier.id))
            .exec(&txn)
            .await?;
        thresholds::Entity::delete_by_id(tier.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// 候选商品列表整体替换
    async fn replace_items(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        tier_id: i64,
        items: &[GiftThresholdItemRequest],
    ) -> AppResult<Vec<threshold_items::Model>> {
        threshold_items::Entity::delete_many()
            .filter(threshold_items::Column::ThresholdId.eq(tier_id))
            .exec(txn)
            .await?;
        let mut saved = Vec::with_capacity(items.len());
        for item in items {
            let row = threshold_items::ActiveModel {
                threshold_id: Set(tier_id),
                product_id: Set(item.product_id),
                variant_id: Set(item.variant_id),
                ..Default::default()
            }
            .insert(txn)
            .await?;
            saved.push(row);
        }
        Ok(saved)
    }

    pub async fn list_auto_gifts(&self, owner: OwnerId) -> AppResult<Vec<AutoGiftResponse>> {
        let list = auto_gifts::Entity::find()
            .filter(owner.filter(auto_gifts::Column::OwnerId))
            .order_by_asc(auto_gifts::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn create_auto_gift(
        &self,
        owner: OwnerId,
        req: &CreateAutoGiftRequest,
    ) -> AppResult<AutoGiftResponse> {
        let gift = auto_gifts::ActiveModel {
            owner_id: Set(owner.to_column()),
            product_id: Set(req.product_id),
            variant_id: Set(req.variant_id),
            is_active: Set(true),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(gift.into())
    }

    pub async fn set_auto_gift_active(
        &self,
        owner: OwnerId,
        gift_id: i64,
        is_active: bool,
    ) -> AppResult<AutoGiftResponse> {
        let gift = auto_gifts::Entity::find_by_id(gift_id)
            .filter(owner.filter(auto_gifts::Column::OwnerId))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Auto gift not found".to_string()))?;
        let mut am = gift.into_active_model();
        am.is_active = Set(is_active);
        let gift = am.update(&self.pool).await?;
        Ok(gift.into())
    }

    pub async fn delete_auto_gift(&self, owner: OwnerId, gift_id: i64) -> AppResult<()> {
        let gift = auto_gifts::Entity::find_by_id(gift_id)
            .filter(owner.filter(auto_gifts::Column::OwnerId))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Auto gift not found".to_string()))?;
        auto_gifts::Entity::delete_by_id(gift.id)
            .exec(&self.pool)
            .await?;
        Ok(())
    }
}

fn validate_tier(threshold_cents: i64, give_coupon: bool, coupon_amount_cents: i64) -> AppResult<()> {
    if threshold_cents <= 0 {
        return Err(AppError::ValidationError(
            "Threshold must be positive".to_string(),
        ));
    }
    if give_coupon && coupon_amount_cents <= 0 {
        return Err(AppError::ValidationError(
            "Coupon amount must be positive when the tier grants coupons".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tier() {
        assert!(validate_tier(1000, false, 0).is_ok());
        assert!(validate_tier(0, false, 0).is_err());
        assert!(validate_tier(1000, true, 0).is_err());
        assert!(validate_tier(1000, true, 200).is_ok());
    }
}
