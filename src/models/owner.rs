use sea_orm::{ColumnTrait, Condition};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 平台共享货架的哨兵值。历史数据中 owner_id 为 NULL 的行同样
/// 属于共享货架，查询时两者都要命中。
pub const ADMIN_OWNER_ID: i64 = 0;

/// 促销数据的租户分区键：平台共享池或某个配送员
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OwnerId {
    Admin,
    Agent(i64),
}

impl OwnerId {
    pub fn from_column(owner_id: Option<i64>) -> Self {
        match owner_id {
            None | Some(ADMIN_OWNER_ID) => OwnerId::Admin,
            Some(id) => OwnerId::Agent(id),
        }
    }

    /// 写库时的列值；共享池统一写哨兵，不再写 NULL
    pub fn to_column(self) -> Option<i64> {
        match self {
            OwnerId::Admin => Some(ADMIN_OWNER_ID),
            OwnerId::Agent(id) => Some(id),
        }
    }

    /// 促销表查询的分区过滤条件
    pub fn filter<C: ColumnTrait>(self, col: C) -> Condition {
        match self {
            OwnerId::Admin => Condition::any()
                .add(col.eq(ADMIN_OWNER_ID))
                .add(col.is_null()),
            OwnerId::Agent(id) => Condition::all().add(col.eq(id)),
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, OwnerId::Admin)
    }
}

/// 鉴权中间件注入的请求身份
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthActor {
    Customer(i64),
    Agent(i64),
    Admin,
}

impl AuthActor {
    pub fn customer_id(&self) -> Option<i64> {
        match self {
            AuthActor::Customer(id) => Some(*id),
            _ => None,
        }
    }

    /// 员工（配送员/管理员）的促销管理分区；顾客无管理分区
    pub fn staff_owner(&self) -> Option<OwnerId> {
        match self {
            AuthActor::Admin => Some(OwnerId::Admin),
            AuthActor::Agent(id) => Some(OwnerId::Agent(*id)),
            AuthActor::Customer(_) => None,
        }
    }
}

/// Owner Scope Resolver 的输出：定价与促销全部以它为准
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerScope {
    pub owner: OwnerId,
    pub address_id: Option<i64>,
    pub building_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_matches_sentinel_and_null() {
        assert_eq!(OwnerId::from_column(None), OwnerId::Admin);
        assert_eq!(OwnerId::from_column(Some(0)), OwnerId::Admin);
        assert_eq!(OwnerId::from_column(Some(7)), OwnerId::Agent(7));
    }

    #[test]
    fn test_to_column_writes_sentinel() {
        assert_eq!(OwnerId::Admin.to_column(), Some(0));
        assert_eq!(OwnerId::Agent(3).to_column(), Some(3));
    }

    #[test]
    fn test_staff_owner() {
        assert_eq!(AuthActor::Admin.staff_owner(), Some(OwnerId::Admin));
        assert_eq!(AuthActor::Agent(5).staff_owner(), Some(OwnerId::Agent(5)));
        assert_eq!(AuthActor::Customer(9).staff_owner(), None);
    }
}
