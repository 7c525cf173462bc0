use crate::entities::{product_entity as products, product_variant_entity as variants};
use crate::error::{AppError, AppResult};
use crate::models::OwnerId;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

/// 商品目录只读访问。订单引擎不在这里做任何写操作。
#[derive(Clone)]
pub struct CatalogService;

impl CatalogService {
    pub fn new() -> Self {
        Self
    }

    /// 按 owner 分区解析商品；不可见与不存在不作区分
    pub async fn get_product<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: i64,
        owner: OwnerId,
    ) -> AppResult<Option<products::Model>> {
        let found = products::Entity::find_by_id(product_id)
            .filter(owner.filter(products::Column::OwnerId))
            .one(conn)
            .await?;
        Ok(found)
    }

    pub async fn get_variant<C: ConnectionTrait>(
        &self,
        conn: &C,
        variant_id: i64,
    ) -> AppResult<Option<variants::Model>> {
        let found = variants::Entity::find_by_id(variant_id).one(conn).await?;
        Ok(found)
    }

    /// 解析规格并校验归属关系
    pub async fn get_variant_of<C: ConnectionTrait>(
        &self,
        conn: &C,
        variant_id: i64,
        product_id: i64,
    ) -> AppResult<variants::Model> {
        let variant = self
            .get_variant(conn, variant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Variant not found".to_string()))?;
        if variant.product_id != product_id {
            return Err(AppError::ValidationError(
                "Variant does not belong to the product".to_string(),
            ));
        }
        Ok(variant)
    }

    /// 规格库存覆盖主商品库存
    pub fn remaining_stock(product: &products::Model, variant: Option<&variants::Model>) -> i64 {
        variant
            .and_then(|v| v.stock)
            .unwrap_or(product.stock)
    }
}

/// 实售价 = 原价 * 折扣 / 10，四舍五入到分
pub fn effective_price_cents(price_cents: i64, discount: i16) -> i64 {
    let scaled = price_cents * discount as i64;
    (scaled + 5) / 10
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_price_no_discount() {
        assert_eq!(effective_price_cents(500, 10), 500);
    }

    #[test]
    fn test_effective_price_rounds_half_up() {
        // 5.55 * 0.5 = 2.775 -> 2.78
        assert_eq!(effective_price_cents(555, 5), 278);
        // 2.99 * 0.9 = 2.691 -> 2.69
        assert_eq!(effective_price_cents(299, 9), 269);
    }

    #[test]
    fn test_effective_price_zero() {
        assert_eq!(effective_price_cents(0, 10), 0);
    }
}
