use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "gift_threshold_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub threshold_id: i64,
    pub product_id: i64,
    pub variant_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
