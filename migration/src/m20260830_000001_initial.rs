use sea_orm_migration::prelude::*;

/// 顾客档案（地址快照尽力维护）
#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    Nickname,
    Phone,
    AddressId,
    BuildingId,
    CreatedAt,
    UpdatedAt,
}

/// 商品（owner_id: NULL/0 = 平台共享货架）
#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Name,
    PriceCents,
    Discount,
    Stock,
    IsActive,
    OwnerId,
    CreatedAt,
    UpdatedAt,
}

/// 商品规格（stock NULL = 跟随主商品库存）
#[derive(DeriveIden)]
enum ProductVariants {
    Table,
    Id,
    ProductId,
    Name,
    Stock,
    CreatedAt,
}

/// 订单（行项目快照存 JSONB）
#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    CustomerId,
    PaymentStatus,
    Items,
    TotalCents,
    DiscountCents,
    CouponId,
    OwnerId,
    AddressId,
    BuildingId,
    Remark,
    CreatedAt,
    UpdatedAt,
}

/// 优惠券（locked_order_id 非空 = 被未完结订单占用）
#[derive(DeriveIden)]
enum Coupons {
    Table,
    Id,
    CustomerId,
    Code,
    AmountCents,
    OwnerId,
    Status,
    LockedOrderId,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}

/// 奖品账本（source_order_id 唯一：一单至多产生一个奖品）
#[derive(DeriveIden)]
enum Rewards {
    Table,
    Id,
    CustomerId,
    OwnerId,
    ProductId,
    VariantId,
    PrizeName,
    UnitValueCents,
    Quantity,
    Status,
    SourceOrderId,
    ConsumedOrderId,
    CreatedAt,
    UpdatedAt,
}

/// 抽奖奖品组（权重 f64）
#[derive(DeriveIden)]
enum LotteryGroups {
    Table,
    Id,
    OwnerId,
    Name,
    Weight,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LotteryGroupItems {
    Table,
    Id,
    GroupId,
    ProductId,
    VariantId,
}

/// 抽奖结果快照（order_id 唯一 = 幂等屏障）
#[derive(DeriveIden)]
enum LotteryDraws {
    Table,
    Id,
    OrderId,
    PrizeName,
    ProductId,
    VariantId,
    UnitPriceCents,
    GroupId,
    IsWin,
    CreatedAt,
}

/// 满额赠送档位
#[derive(DeriveIden)]
enum GiftThresholds {
    Table,
    Id,
    OwnerId,
    ThresholdCents,
    GiveProducts,
    GiveCoupon,
    CouponAmountCents,
    PerOrderLimit,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum GiftThresholdItems {
    Table,
    Id,
    ThresholdId,
    ProductId,
    VariantId,
}

/// 常驻赠品池
#[derive(DeriveIden)]
enum AutoGifts {
    Table,
    Id,
    OwnerId,
    ProductId,
    VariantId,
    IsActive,
    CreatedAt,
}

/// 购物车（支付成功时按 customer + owner 清空）
#[derive(DeriveIden)]
enum CartItems {
    Table,
    Id,
    CustomerId,
    OwnerId,
    ProductId,
    VariantId,
    Quantity,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Customers::Nickname).string().not_null())
                    .col(ColumnDef::new(Customers::Phone).string())
                    .col(ColumnDef::new(Customers::AddressId).big_integer())
                    .col(ColumnDef::new(Customers::BuildingId).big_integer())
                    .col(
                        ColumnDef::new(Customers::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Customers::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::PriceCents).big_integer().not_null())
                    .col(
                        ColumnDef::new(Products::Discount)
                            .small_integer()
                            .not_null()
                            .default(10),
                    )
                    .col(
                        ColumnDef::new(Products::Stock)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Products::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Products::OwnerId).big_integer())
                    .col(
                        ColumnDef::new(Products::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Products::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_owner")
                    .table(Products::Table)
                    .col(Products::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductVariants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductVariants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProductVariants::ProductId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductVariants::Name).string().not_null())
                    .col(ColumnDef::new(ProductVariants::Stock).big_integer())
                    .col(
                        ColumnDef::new(ProductVariants::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_variants_product")
                    .table(ProductVariants::Table)
                    .col(ProductVariants::ProductId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Orders::CustomerId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Orders::PaymentStatus)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Orders::Items).json_binary().not_null())
                    .col(ColumnDef::new(Orders::TotalCents).big_integer().not_null())
                    .col(
                        ColumnDef::new(Orders::DiscountCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Orders::CouponId).big_integer())
                    .col(ColumnDef::new(Orders::OwnerId).big_integer())
                    .col(ColumnDef::new(Orders::AddressId).big_integer())
                    .col(ColumnDef::new(Orders::BuildingId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::Remark).string())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Orders::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_customer")
                    .table(Orders::Table)
                    .col(Orders::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_status_created")
                    .table(Orders::Table)
                    .col(Orders::PaymentStatus)
                    .col(Orders::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Coupons::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Coupons::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Coupons::CustomerId).big_integer().not_null())
                    .col(ColumnDef::new(Coupons::Code).string().not_null())
                    .col(ColumnDef::new(Coupons::AmountCents).big_integer().not_null())
                    .col(ColumnDef::new(Coupons::OwnerId).big_integer())
                    .col(
                        ColumnDef::new(Coupons::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Coupons::LockedOrderId).big_integer())
                    .col(ColumnDef::new(Coupons::ExpiresAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Coupons::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Coupons::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_coupons_customer_status")
                    .table(Coupons::Table)
                    .col(Coupons::CustomerId)
                    .col(Coupons::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Rewards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rewards::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rewards::CustomerId).big_integer().not_null())
                    .col(ColumnDef::new(Rewards::OwnerId).big_integer())
                    .col(ColumnDef::new(Rewards::ProductId).big_integer())
                    .col(ColumnDef::new(Rewards::VariantId).big_integer())
                    .col(ColumnDef::new(Rewards::PrizeName).string().not_null())
                    .col(
                        ColumnDef::new(Rewards::UnitValueCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Rewards::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Rewards::Status)
                            .string()
                            .not_null()
                            .default("eligible"),
                    )
                    .col(
                        ColumnDef::new(Rewards::SourceOrderId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Rewards::ConsumedOrderId).big_integer())
                    .col(
                        ColumnDef::new(Rewards::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Rewards::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // 一单至多产生一个奖品
        manager
            .create_index(
                Index::create()
                    .name("uq_rewards_source_order")
                    .table(Rewards::Table)
                    .col(Rewards::SourceOrderId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rewards_customer_status")
                    .table(Rewards::Table)
                    .col(Rewards::CustomerId)
                    .col(Rewards::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LotteryGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LotteryGroups::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LotteryGroups::OwnerId).big_integer())
                    .col(ColumnDef::new(LotteryGroups::Name).string().not_null())
                    .col(ColumnDef::new(LotteryGroups::Weight).double().not_null())
                    .col(
                        ColumnDef::new(LotteryGroups::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LotteryGroups::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(LotteryGroups::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LotteryGroupItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LotteryGroupItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LotteryGroupItems::GroupId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LotteryGroupItems::ProductId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LotteryGroupItems::VariantId).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lottery_group_items_group")
                    .table(LotteryGroupItems::Table)
                    .col(LotteryGroupItems::GroupId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LotteryDraws::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LotteryDraws::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LotteryDraws::OrderId).big_integer().not_null())
                    .col(ColumnDef::new(LotteryDraws::PrizeName).string().not_null())
                    .col(ColumnDef::new(LotteryDraws::ProductId).big_integer())
                    .col(ColumnDef::new(LotteryDraws::VariantId).big_integer())
                    .col(
                        ColumnDef::new(LotteryDraws::UnitPriceCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(LotteryDraws::GroupId).big_integer())
                    .col(
                        ColumnDef::new(LotteryDraws::IsWin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LotteryDraws::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 每单只能抽一次；并发重复请求靠它拦住
        manager
            .create_index(
                Index::create()
                    .name("uq_lottery_draws_order")
                    .table(LotteryDraws::Table)
                    .col(LotteryDraws::OrderId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GiftThresholds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GiftThresholds::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GiftThresholds::OwnerId).big_integer())
                    .col(
                        ColumnDef::new(GiftThresholds::ThresholdCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GiftThresholds::GiveProducts)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GiftThresholds::GiveCoupon)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GiftThresholds::CouponAmountCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(GiftThresholds::PerOrderLimit).integer())
                    .col(
                        ColumnDef::new(GiftThresholds::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(GiftThresholds::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(GiftThresholds::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GiftThresholdItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GiftThresholdItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GiftThresholdItems::ThresholdId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GiftThresholdItems::ProductId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GiftThresholdItems::VariantId).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_gift_threshold_items_threshold")
                    .table(GiftThresholdItems::Table)
                    .col(GiftThresholdItems::ThresholdId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AutoGifts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AutoGifts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AutoGifts::OwnerId).big_integer())
                    .col(ColumnDef::new(AutoGifts::ProductId).big_integer().not_null())
                    .col(ColumnDef::new(AutoGifts::VariantId).big_integer())
                    .col(
                        ColumnDef::new(AutoGifts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AutoGifts::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CartItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CartItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CartItems::CustomerId).big_integer().not_null())
                    .col(ColumnDef::new(CartItems::OwnerId).big_integer())
                    .col(ColumnDef::new(CartItems::ProductId).big_integer().not_null())
                    .col(ColumnDef::new(CartItems::VariantId).big_integer())
                    .col(
                        ColumnDef::new(CartItems::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(CartItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cart_items_customer")
                    .table(CartItems::Table)
                    .col(CartItems::CustomerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Table::drop().table(CartItems::Table).to_owned(),
            Table::drop().table(AutoGifts::Table).to_owned(),
            Table::drop().table(GiftThresholdItems::Table).to_owned(),
            Table::drop().table(GiftThresholds::Table).to_owned(),
            Table::drop().table(LotteryDraws::Table).to_owned(),
            Table::drop().table(LotteryGroupItems::Table).to_owned(),
            Table::drop().table(LotteryGroups::Table).to_owned(),
            Table::drop().table(Rewards::Table).to_owned(),
            Table::drop().table(Coupons::Table).to_owned(),
            Table::drop().table(Orders::Table).to_owned(),
            Table::drop().table(ProductVariants::Table).to_owned(),
            Table::drop().table(Products::Table).to_owned(),
            Table::drop().table(Customers::Table).to_owned(),
        ] {
            manager.drop_table(table).await?;
        }
        Ok(())
    }
}
