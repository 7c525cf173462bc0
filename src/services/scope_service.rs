use crate::config::ShopConfig;
use crate::database::DbPool;
use crate::entities::customer_entity as customers;
use crate::error::{AppError, AppResult};
use crate::models::{AuthActor, OwnerId, OwnerScope};
use sea_orm::EntityTrait;

/// 把请求上下文解析成租户分区 + 配送地址。
/// 定价与促销查询必须先经过这里。
#[derive(Clone)]
pub struct ScopeService {
    pool: DbPool,
    shop: ShopConfig,
}

impl ScopeService {
    pub fn new(pool: DbPool, shop: ShopConfig) -> Self {
        Self { pool, shop }
    }

    /// 解析下单范围：
    /// - 店铺打烊时直接拒绝
    /// - agent_id 指定配送员自营货架，否则落在平台共享货架
    /// - 地址/楼栋优先取请求覆盖值，缺省回落到顾客档案缓存
    /// - 解析不出楼栋是硬性拒绝（提示选择配送地址）
    pub async fn resolve(
        &self,
        actor: &AuthActor,
        agent_id: Option<i64>,
        address_id: Option<i64>,
        building_id: Option<i64>,
    ) -> AppResult<OwnerScope> {
        if !self.shop.is_open {
            return Err(AppError::ValidationError(
                "The shop is closed for now".to_string(),
            ));
        }

        let owner = match agent_id {
            Some(id) if id > 0 => OwnerId::Agent(id),
            _ => OwnerId::Admin,
        };

        let (mut address_id, mut building_id) = (address_id, building_id);
        if building_id.is_none()
            && let Some(customer_id) = actor.customer_id()
            && let Some(profile) = customers::Entity::find_by_id(customer_id)
                .one(&self.pool)
                .await?
        {
            building_id = profile.building_id;
            if address_id.is_none() {
                address_id = profile.address_id;
            }
        }

        let building_id = building_id.ok_or_else(|| {
            AppError::ValidationError("Please select a delivery address".to_string())
        })?;

        Ok(OwnerScope {
            owner,
            address_id,
            building_id,
        })
    }
}
